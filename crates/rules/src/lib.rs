use std::collections::HashSet;

use shared::domain::{DatapointId, FieldContent, FieldNode, Scalar};
use shared::protocol::{
    Message, Operation, ReplaceValue, SelectOption, WebhookRequest, WebhookResponse,
};
use thiserror::Error;
use tracing::debug;

/// Provenance tag attached to every engine-emitted replace operation, so the
/// platform can tell machine-applied edits from human ones.
pub const VALIDATION_SOURCE: &str = "connector";

/// Label and value of the picker entry emitted when no vendor matches.
pub const NO_MATCH_SENTINEL: &str = "---";

/// Recursion cap for the tree walk; annotation trees are a couple of levels
/// deep in practice, anything past this is a malformed document.
const MAX_TREE_DEPTH: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("no datapoint with schema id '{schema_id}' in annotation tree")]
    SchemaLookup { schema_id: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMode {
    Initialize,
    Edit,
}

/// Per-request context: how the evaluation was triggered and which datapoints
/// changed since the previous one. Built once from the request, read-only.
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    pub mode: TriggerMode,
    pub changed: HashSet<DatapointId>,
}

impl EvaluationContext {
    pub fn from_request(request: &WebhookRequest) -> Self {
        let mode = if request.action == "initialize" {
            TriggerMode::Initialize
        } else {
            TriggerMode::Edit
        };
        Self {
            mode,
            changed: request.updated_datapoints.iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VendorRecord {
    pub name: String,
    pub vendor_id: i64,
}

impl VendorRecord {
    pub fn new(name: impl Into<String>, vendor_id: i64) -> Self {
        Self {
            name: name.into(),
            vendor_id,
        }
    }
}

/// Lookup capability behind the vendor-matching rule. The static stand-in is
/// the reference implementation; a datastore-backed one slots in here.
pub trait VendorCatalog {
    fn vendors(&self) -> &[VendorRecord];
}

/// In-process catalog stand-in for an external vendor database.
pub struct StaticCatalog {
    vendors: Vec<VendorRecord>,
}

impl StaticCatalog {
    pub fn new(vendors: Vec<VendorRecord>) -> Self {
        Self { vendors }
    }
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self::new(vec![
            VendorRecord::new("Roboyo", 1),
            VendorRecord::new("Rossum", 2),
            VendorRecord::new("Volvo", 3),
        ])
    }
}

impl VendorCatalog for StaticCatalog {
    fn vendors(&self) -> &[VendorRecord] {
        &self.vendors
    }
}

/// Find the first node with the given schema id, pre-order depth-first.
/// Schema ids are not guaranteed unique; document order decides ties.
pub fn find_by_schema_id<'a>(nodes: &'a [FieldNode], schema_id: &str) -> Option<&'a FieldNode> {
    find_bounded(nodes, schema_id, 0)
}

fn find_bounded<'a>(nodes: &'a [FieldNode], schema_id: &str, depth: usize) -> Option<&'a FieldNode> {
    if depth > MAX_TREE_DEPTH {
        return None;
    }
    for node in nodes {
        if node.schema_id == schema_id {
            return Some(node);
        }
        if let Some(children) = &node.children {
            if let Some(found) = find_bounded(children, schema_id, depth + 1) {
                return Some(found);
            }
        }
    }
    None
}

fn require<'a>(tree: &'a [FieldNode], schema_id: &'static str) -> Result<&'a FieldNode, RuleError> {
    find_by_schema_id(tree, schema_id).ok_or(RuleError::SchemaLookup { schema_id })
}

/// What one rule contributes to the response; the orchestrator concatenates
/// outcomes in rule order.
#[derive(Debug, Default, PartialEq)]
pub struct RuleOutcome {
    pub messages: Vec<Message>,
    pub operations: Vec<Operation>,
}

/// Strip every non-digit character from the invoice id. Emits a replace only
/// when the value actually changes, so re-evaluation is a no-op.
pub fn normalize_invoice_id(tree: &[FieldNode]) -> Result<RuleOutcome, RuleError> {
    let invoice = require(tree, "invoice_id")?;
    let current = invoice.text_value();
    let normalized: String = current.chars().filter(|c| c.is_ascii_digit()).collect();

    let mut outcome = RuleOutcome::default();
    if normalized != current.as_ref() {
        outcome.operations.push(Operation::replace(
            invoice.id.clone(),
            ReplaceValue {
                content: FieldContent::new(normalized.as_str()),
                options: None,
                validation_sources: vec![VALIDATION_SOURCE.to_string()],
            },
        ));
    }
    Ok(outcome)
}

/// Warn when the order id is present but not six digits. Advisory only.
pub fn validate_order_id(tree: &[FieldNode]) -> Result<RuleOutcome, RuleError> {
    let order = require(tree, "order_id")?;
    let value = order.text_value();

    let mut outcome = RuleOutcome::default();
    if !value.is_empty() && !is_six_digits(&value) {
        outcome
            .messages
            .push(Message::warning(order.id.clone(), "Invalid order_id format."));
    }
    Ok(outcome)
}

fn is_six_digits(value: &str) -> bool {
    value.len() == 6 && value.bytes().all(|b| b.is_ascii_digit())
}

/// Pre-populate the vendor enum by matching the extracted vendor name against
/// the catalog. Substring containment on normalized names keeps partial and
/// abbreviated input working; all matches are offered so the user can make
/// the final pick in case of ambiguity.
pub fn match_vendor(
    tree: &[FieldNode],
    ctx: &EvaluationContext,
    catalog: &dyn VendorCatalog,
) -> Result<RuleOutcome, RuleError> {
    let vendor = require(tree, "vendor")?;
    let vendor_name = require(tree, "vendor_name")?;

    let mut outcome = RuleOutcome::default();

    // Do not touch the enum unless we have a reason: first load, or the name
    // itself was edited.
    if ctx.mode != TriggerMode::Initialize && !ctx.changed.contains(&vendor_name.id) {
        debug!(vendor_name = %vendor_name.id, "vendor name untouched, skipping match");
        return Ok(outcome);
    }

    let needle = normalize_vendor_name(&vendor_name.text_value());
    let matched: Vec<&VendorRecord> = catalog
        .vendors()
        .iter()
        .filter(|record| {
            !needle.is_empty() && normalize_vendor_name(&record.name).contains(needle.as_str())
        })
        .collect();

    let options: Vec<SelectOption> = if matched.is_empty() {
        outcome
            .messages
            .push(Message::error(vendor_name.id.clone(), "Vendor not found."));
        vec![SelectOption {
            value: Scalar::Str(NO_MATCH_SENTINEL.to_string()),
            label: NO_MATCH_SENTINEL.to_string(),
        }]
    } else {
        matched
            .iter()
            .map(|record| SelectOption {
                value: Scalar::Num(record.vendor_id),
                label: record.name.clone(),
            })
            .collect()
    };

    outcome.operations.push(Operation::replace(
        vendor.id.clone(),
        ReplaceValue {
            content: FieldContent {
                value: options[0].value.clone(),
            },
            options: Some(options),
            validation_sources: vec![VALIDATION_SOURCE.to_string()],
        },
    ));
    Ok(outcome)
}

/// Commas, periods and whitespace are noise in vendor names; comparison is
/// case-insensitive on what remains.
fn normalize_vendor_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ',' | '.') && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Run every rule in fixed order over one request's tree. Emission order is
/// part of the interface: consumers display messages and apply operations in
/// sequence. A lookup failure in any rule aborts the whole evaluation.
pub fn evaluate(
    tree: &[FieldNode],
    ctx: &EvaluationContext,
    catalog: &dyn VendorCatalog,
) -> Result<WebhookResponse, RuleError> {
    let mut response = WebhookResponse::default();
    for outcome in [
        normalize_invoice_id(tree)?,
        validate_order_id(tree)?,
        match_vendor(tree, ctx, catalog)?,
    ] {
        response.messages.extend(outcome.messages);
        response.operations.extend(outcome.operations);
    }
    Ok(response)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
