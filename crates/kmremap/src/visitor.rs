//! Hooks metadata rewriting into a class visitor chain
//!
//! [`MetadataRemapper`] rewrites one metadata annotation. The
//! [`KotlinMetadataRemappingClassVisitor`] sits in front of another
//! [`ClassVisitor`], rewrites the metadata annotation when it goes by and
//! forwards every event.

use crate::annotation::AnnotationNode;
use crate::config::RemapConfig;
use crate::error::RemapError;
use crate::header::Header;
use crate::mapper::NameMapper;
use crate::metadata::KotlinClassMetadata;
use crate::remap::KotlinClassRemapper;
use crate::version::{self, Diagnostic};
use tracing::{debug, info, trace};

/// Receives the class-level events of one class file
pub trait ClassVisitor {
    /// Start of a class; `name` is its internal name
    fn visit(&mut self, name: &str) {
        let _ = name;
    }

    /// A class annotation
    fn visit_annotation(
        &mut self,
        annotation: AnnotationNode,
        visible: bool,
    ) -> Result<(), RemapError> {
        let _ = (annotation, visible);
        Ok(())
    }

    /// End of the class
    fn visit_end(&mut self) {}
}

impl<V: ClassVisitor + ?Sized> ClassVisitor for &mut V {
    fn visit(&mut self, name: &str) {
        (**self).visit(name);
    }

    fn visit_annotation(
        &mut self,
        annotation: AnnotationNode,
        visible: bool,
    ) -> Result<(), RemapError> {
        (**self).visit_annotation(annotation, visible)
    }

    fn visit_end(&mut self) {
        (**self).visit_end();
    }
}

/// Records everything it is sent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassNode {
    /// Internal name
    pub name: Option<String>,
    /// Runtime-visible annotations
    pub visible_annotations: Vec<AnnotationNode>,
    /// Runtime-invisible annotations
    pub invisible_annotations: Vec<AnnotationNode>,
    /// Whether `visit_end` was called
    pub ended: bool,
}

impl ClassNode {
    /// Create an empty node
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay the recorded events into another visitor
    pub fn accept<V: ClassVisitor + ?Sized>(&self, visitor: &mut V) -> Result<(), RemapError> {
        if let Some(name) = &self.name {
            visitor.visit(name);
        }
        for annotation in &self.visible_annotations {
            visitor.visit_annotation(annotation.clone(), true)?;
        }
        for annotation in &self.invisible_annotations {
            visitor.visit_annotation(annotation.clone(), false)?;
        }
        if self.ended {
            visitor.visit_end();
        }
        Ok(())
    }
}

impl ClassVisitor for ClassNode {
    fn visit(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    fn visit_annotation(
        &mut self,
        annotation: AnnotationNode,
        visible: bool,
    ) -> Result<(), RemapError> {
        if visible {
            self.visible_annotations.push(annotation);
        } else {
            self.invisible_annotations.push(annotation);
        }
        Ok(())
    }

    fn visit_end(&mut self) {
        self.ended = true;
    }
}

/// Why an annotation was forwarded untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassthroughReason {
    /// The annotation had no elements
    Empty,
    /// A synthetic class that is not a lambda
    NotALambda,
    /// A multi-file facade or an unknown kind
    Opaque,
}

/// What happened to an annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemapOutcome {
    /// The payload was decoded, rewritten and encoded again
    Rewritten,
    /// The original annotation was kept
    PassedThrough(PassthroughReason),
}

/// Result of rewriting one metadata annotation
#[derive(Debug, Clone, PartialEq)]
pub struct RemapResult {
    /// Annotation to forward
    pub annotation: AnnotationNode,
    /// What happened
    pub outcome: RemapOutcome,
    /// Advisory findings
    pub diagnostics: Vec<Diagnostic>,
}

/// Rewrites metadata annotations through a [`NameMapper`]
///
/// Holds no per-class state and can be shared between threads.
pub struct MetadataRemapper<'a, M: NameMapper + ?Sized> {
    mapper: &'a M,
    config: RemapConfig,
}

impl<'a, M: NameMapper + ?Sized> MetadataRemapper<'a, M> {
    /// Create a remapper with the default configuration
    pub fn new(mapper: &'a M) -> Self {
        Self::with_config(mapper, RemapConfig::default())
    }

    /// Create a remapper with an explicit configuration
    pub fn with_config(mapper: &'a M, config: RemapConfig) -> Self {
        Self { mapper, config }
    }

    /// The configuration in use
    pub fn config(&self) -> &RemapConfig {
        &self.config
    }

    /// Whether an annotation descriptor denotes the metadata annotation
    pub fn is_metadata_annotation(&self, desc: &str) -> bool {
        desc == self.config.annotation_descriptor
    }

    /// Rewrite one metadata annotation of class `class_name`
    pub fn remap_annotation(
        &self,
        class_name: &str,
        annotation: &AnnotationNode,
    ) -> Result<RemapResult, RemapError> {
        let template = annotation.values.as_deref();
        let header = Header::from_annotation_values(template)
            .map_err(|e| RemapError::new(class_name, e))?;
        let (Some(header), Some(template)) = (header, template) else {
            debug!(class = class_name, "metadata annotation is empty, passing through");
            return Ok(passthrough(annotation, PassthroughReason::Empty, Vec::new()));
        };

        let mut diagnostics = Vec::new();
        if let Some(diagnostic) =
            version::check_version(class_name, &header, &self.config.metadata_version)
        {
            info!(class = class_name, "{diagnostic}");
            diagnostics.push(diagnostic);
        }

        let metadata =
            KotlinClassMetadata::read(&header).map_err(|e| RemapError::new(class_name, e))?;
        if !metadata.is_remappable() {
            let reason = match metadata {
                KotlinClassMetadata::SyntheticClass { .. } => PassthroughReason::NotALambda,
                _ => PassthroughReason::Opaque,
            };
            debug!(class = class_name, kind = header.kind, ?reason, "passing metadata through");
            return Ok(passthrough(annotation, reason, diagnostics));
        }

        let remapped = KotlinClassRemapper::new(self.mapper).remap_metadata(metadata);
        let new_header = remapped.write(&header);

        if self.config.report_size_drift {
            if let Some(diagnostic) = version::check_payload_drift(class_name, &header, &new_header)
            {
                info!(class = class_name, "{diagnostic}");
                diagnostics.push(diagnostic);
            }
        }

        trace!(class = class_name, kind = header.kind, "rewrote metadata");
        Ok(RemapResult {
            annotation: AnnotationNode {
                desc: annotation.desc.clone(),
                values: Some(new_header.to_annotation_values(template)),
            },
            outcome: RemapOutcome::Rewritten,
            diagnostics,
        })
    }
}

fn passthrough(
    annotation: &AnnotationNode,
    reason: PassthroughReason,
    diagnostics: Vec<Diagnostic>,
) -> RemapResult {
    RemapResult {
        annotation: annotation.clone(),
        outcome: RemapOutcome::PassedThrough(reason),
        diagnostics,
    }
}

/// Class visitor that rewrites the metadata annotation before forwarding it
pub struct KotlinMetadataRemappingClassVisitor<'a, M: NameMapper + ?Sized, V: ClassVisitor> {
    remapper: MetadataRemapper<'a, M>,
    next: V,
    class_name: Option<String>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a, M: NameMapper + ?Sized, V: ClassVisitor> KotlinMetadataRemappingClassVisitor<'a, M, V> {
    /// Wrap `next`, rewriting with `mapper` and the default configuration
    pub fn new(mapper: &'a M, next: V) -> Self {
        Self::with_remapper(MetadataRemapper::new(mapper), next)
    }

    /// Wrap `next` with a configured remapper
    pub fn with_remapper(remapper: MetadataRemapper<'a, M>, next: V) -> Self {
        Self {
            remapper,
            next,
            class_name: None,
            diagnostics: Vec::new(),
        }
    }

    /// Diagnostics collected so far
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The wrapped visitor
    pub fn next(&self) -> &V {
        &self.next
    }

    /// Unwrap into the wrapped visitor and the collected diagnostics
    pub fn into_parts(self) -> (V, Vec<Diagnostic>) {
        (self.next, self.diagnostics)
    }
}

impl<'a, M: NameMapper + ?Sized, V: ClassVisitor> ClassVisitor
    for KotlinMetadataRemappingClassVisitor<'a, M, V>
{
    fn visit(&mut self, name: &str) {
        self.class_name = Some(name.to_string());
        self.next.visit(name);
    }

    fn visit_annotation(
        &mut self,
        annotation: AnnotationNode,
        visible: bool,
    ) -> Result<(), RemapError> {
        if !self.remapper.is_metadata_annotation(&annotation.desc) {
            return self.next.visit_annotation(annotation, visible);
        }

        let class_name = self.class_name.as_deref().unwrap_or("<unknown>");
        let result = self.remapper.remap_annotation(class_name, &annotation)?;
        self.diagnostics.extend(result.diagnostics);
        self.next.visit_annotation(result.annotation, visible)
    }

    fn visit_end(&mut self) {
        self.next.visit_end();
    }
}
