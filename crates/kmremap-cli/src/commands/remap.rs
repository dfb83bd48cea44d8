//! `kmremap remap`: Rewrite the class names of one metadata header.

use super::read_header;
use crate::output::StyledOutput;
use anyhow::Context;
use kmremap::{read_tiny_file, Diagnostic, Header, MetadataRemapper, RemapConfig, RemapOutcome};
use std::path::{Path, PathBuf};
use termcolor::ColorChoice;

/// Arguments of `kmremap remap`
pub struct RemapOptions {
    pub header: PathBuf,
    pub mappings: PathBuf,
    pub from: Option<String>,
    pub to: Option<String>,
    pub class_name: Option<String>,
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

pub fn execute(options: RemapOptions, color: ColorChoice) -> anyhow::Result<()> {
    let mut out = StyledOutput::new(color);
    let (header, outcome, diagnostics) = run(&options)?;

    for diagnostic in &diagnostics {
        out.diagnostic(diagnostic);
    }
    if let RemapOutcome::PassedThrough(reason) = outcome {
        out.info("Unchanged", &format!("({reason:?})"));
    }

    let json = serde_json::to_string_pretty(&header)?;
    match &options.output {
        Some(path) => {
            std::fs::write(path, format!("{json}\n"))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            out.success("Remapped", &path.display().to_string());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Remap the header named by `options`
pub fn run(options: &RemapOptions) -> anyhow::Result<(Header, RemapOutcome, Vec<Diagnostic>)> {
    let config = match &options.config {
        Some(path) => RemapConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RemapConfig::default(),
    };

    let from = options.from.as_deref().unwrap_or(&config.source_namespace);
    let to = options.to.as_deref().unwrap_or(&config.target_namespace);
    let mapper = read_tiny_file(&options.mappings, from, to)
        .with_context(|| format!("Failed to load mappings {}", options.mappings.display()))?;

    let header = read_header(&options.header)?;
    let class_name = options
        .class_name
        .clone()
        .unwrap_or_else(|| class_name_from_path(&options.header));

    let mut annotation = header.to_annotation();
    annotation.desc = config.annotation_descriptor.clone();

    let remapper = MetadataRemapper::with_config(&mapper, config);
    let result = remapper.remap_annotation(&class_name, &annotation)?;
    tracing::info!(class = %class_name, outcome = ?result.outcome, "remapped header");

    let remapped = Header::from_annotation_values(result.annotation.values.as_deref())?
        .unwrap_or(header);
    Ok((remapped, result.outcome, result.diagnostics))
}

fn class_name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "<unknown>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kmremap::model::{JvmMethodSignature, KmClass, KmFunction};
    use kmremap::KotlinClassMetadata;

    const MAPPINGS: &str = "tiny\t2\t0\tnamed\tintermediary\n\
        c\ta/b/C\tnet/minecraft/class_1\n";

    fn write_fixture(dir: &Path) -> RemapOptions {
        let mut class = KmClass::new("a/b/C");
        let mut function = KmFunction::new("foo");
        function.signature = Some(JvmMethodSignature::new("foo", "(La/b/C;)V"));
        class.functions.push(function);
        let header = KotlinClassMetadata::Class { class }.write(&Header {
            metadata_version: vec![2, 1, 0],
            ..Header::default()
        });

        let header_path = dir.join("C.json");
        std::fs::write(&header_path, serde_json::to_string(&header).unwrap()).unwrap();
        let mappings = dir.join("mappings.tiny");
        std::fs::write(&mappings, MAPPINGS).unwrap();

        RemapOptions {
            header: header_path,
            mappings,
            from: None,
            to: None,
            class_name: Some("a/b/C".to_string()),
            config: None,
            output: None,
        }
    }

    #[test]
    fn test_remap_header_file() {
        let dir = tempfile::tempdir().unwrap();
        let options = write_fixture(dir.path());

        let (header, outcome, diagnostics) = run(&options).unwrap();
        assert_eq!(outcome, RemapOutcome::Rewritten);
        assert!(diagnostics.is_empty());
        match KotlinClassMetadata::read(&header).unwrap() {
            KotlinClassMetadata::Class { class } => {
                assert_eq!(class.name, "net/minecraft/class_1");
                let signature = class.functions[0].signature.as_ref().unwrap();
                assert_eq!(signature.desc.as_deref(), Some("(Lnet/minecraft/class_1;)V"));
            }
            other => panic!("expected a class, got {other:?}"),
        }
    }

    #[test]
    fn test_reverse_namespaces() {
        let dir = tempfile::tempdir().unwrap();
        let mut options = write_fixture(dir.path());
        options.from = Some("intermediary".to_string());
        options.to = Some("named".to_string());

        let (header, _, _) = run(&options).unwrap();
        let original = read_header(&options.header).unwrap();
        assert_eq!(header, original);
    }

    #[test]
    fn test_writes_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut options = write_fixture(dir.path());
        let output = dir.path().join("out.json");
        options.output = Some(output.clone());

        execute(options, ColorChoice::Never).unwrap();
        let written = read_header(&output).unwrap();
        assert_eq!(written.kind, 1);
        assert!(written.data2.iter().any(|s| s.contains("net/minecraft/class_1")));
    }

    #[test]
    fn test_missing_mappings_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut options = write_fixture(dir.path());
        options.mappings = dir.path().join("missing.tiny");

        let error = run(&options).unwrap_err();
        assert!(error.to_string().contains("Failed to load mappings"));
    }

    #[test]
    fn test_class_name_from_path() {
        assert_eq!(class_name_from_path(Path::new("out/Foo.json")), "Foo");
    }
}
