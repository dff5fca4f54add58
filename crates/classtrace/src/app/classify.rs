//! Locate, generate, and mutate in one pass over a frozen document snapshot.

use serde::Serialize;

use crate::app::mutate::{PathMarker, TextEdit, plan_element_edit};
use crate::app::options::OptionSettings;
use crate::app::rules::Rule;
use crate::app::scanner::{
    DEFAULT_MARKER_ATTRIBUTE, compute_ancestor_chain, locate_element_with_marker,
};
use crate::domain::errors::DomainError;
use crate::domain::model::{ElementInfo, GenerationContext};

/// Outcome of classifying one element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub class_name: String,
    pub rule: String,
    pub element: ElementInfo,
    pub ancestors: Vec<String>,
    pub edit: TextEdit,
    /// `false` when the element already carried the class (and marker).
    pub changed: bool,
}

/// Runs rules against elements using one configuration snapshot.
#[derive(Debug, Clone)]
pub struct Classifier<'a> {
    settings: &'a OptionSettings,
    marker_attribute: String,
    emit_marker: bool,
}

impl<'a> Classifier<'a> {
    pub fn new(settings: &'a OptionSettings) -> Self {
        Self {
            settings,
            marker_attribute: DEFAULT_MARKER_ATTRIBUTE.to_owned(),
            emit_marker: false,
        }
    }

    /// Also record the workspace-relative path in `attribute`.
    pub fn with_path_marker(mut self, attribute: impl Into<String>) -> Self {
        self.marker_attribute = attribute.into();
        self.emit_marker = true;
        self
    }

    /// Locate the element at `context.element_offset` and generate its class name.
    ///
    /// The returned context points at the element's `<` rather than at the cursor.
    pub fn generate(
        &self,
        context: &GenerationContext,
        rule: &Rule,
    ) -> Result<(ElementInfo, GenerationContext, String), DomainError> {
        let cursor = context.element_offset;
        let element =
            locate_element_with_marker(&context.document_text, cursor, &self.marker_attribute)
                .ok_or(DomainError::ElementNotFound { offset: cursor })?;

        tracing::debug!(
            tag = %element.tag_name,
            start = element.start,
            end = element.end,
            has_class = element.has_class(),
            "located element"
        );

        let element_context = context.at_offset(element.start);
        let class_name = rule.generate(&element_context, self.settings);
        if class_name.is_empty() {
            return Err(DomainError::EmptyResult {
                rule: rule.id.clone(),
            });
        }

        Ok((element, element_context, class_name))
    }

    /// Generate the class for the element under the cursor and plan the tag rewrite.
    pub fn classify(
        &self,
        context: &GenerationContext,
        rule: &Rule,
    ) -> Result<Classification, DomainError> {
        let (element, element_context, class_name) = self.generate(context, rule)?;

        let marker = self.emit_marker.then(|| PathMarker {
            attribute: self.marker_attribute.clone(),
            value: marker_value(&element_context.relative_path),
        });
        let edit = plan_element_edit(
            &context.document_text,
            &element,
            &class_name,
            marker.as_ref(),
        );
        let changed = !edit.is_noop(&context.document_text);

        Ok(Classification {
            ancestors: compute_ancestor_chain(&element_context.document_text, element.start),
            class_name,
            rule: rule.id.clone(),
            element,
            edit,
            changed,
        })
    }
}

/// Path marker value: the relative path with `/` separators.
pub fn marker_value(relative_path: &str) -> String {
    relative_path.replace('\\', "/")
}
