// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-run conversion state and the transfer log.

use crate::schema::Schema;
use indexmap::IndexMap;
use nodeflow_graph::NodeRef;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Original node -> converted node, for one run
#[derive(Debug, Clone, Default)]
pub struct ConversionCache {
    entries: IndexMap<NodeRef, NodeRef>,
}

impl ConversionCache {
    /// Converted reference for an original node
    pub fn get(&self, original: &NodeRef) -> Option<&NodeRef> {
        self.entries.get(original)
    }

    /// Record a conversion
    pub fn insert(&mut self, original: NodeRef, converted: NodeRef) {
        self.entries.insert(original, converted);
    }

    /// Whether the node was handled in this run
    pub fn contains(&self, original: &NodeRef) -> bool {
        self.entries.contains_key(original)
    }

    /// Number of handled nodes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was handled yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mappings that replaced a node, in conversion order
    pub fn replacements(&self) -> impl Iterator<Item = (&NodeRef, &NodeRef)> {
        self.entries.iter().filter(|(original, converted)| original != converted)
    }
}

/// Tag on a transfer log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogTag {
    /// An entry was applied
    Ok,
    /// An entry or step was skipped
    Skip,
    /// An entry or step failed
    Fail,
    /// Informational note
    Info,
    /// A node was created
    Create,
    /// Consumers were reassigned
    Assign,
}

impl LogTag {
    /// Tag text
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Skip => "SKIP",
            Self::Fail => "FAIL",
            Self::Info => "INFO",
            Self::Create => "CREATE",
            Self::Assign => "ASSIGN",
        }
    }
}

impl fmt::Display for LogTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of the transfer log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogLine {
    /// Tag
    pub tag: LogTag,
    /// Message
    pub message: String,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.tag, self.message)
    }
}

/// Ordered, tagged log returned to the caller. Every line is mirrored to
/// `tracing`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferLog {
    lines: Vec<LogLine>,
}

impl TransferLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line
    pub fn push(&mut self, tag: LogTag, message: impl Into<String>) {
        let message = message.into();
        match tag {
            LogTag::Ok | LogTag::Info => tracing::debug!(tag = %tag, "{}", message),
            LogTag::Create | LogTag::Assign => tracing::info!(tag = %tag, "{}", message),
            LogTag::Skip | LogTag::Fail => tracing::warn!(tag = %tag, "{}", message),
        }
        self.lines.push(LogLine { tag, message });
    }

    /// Append an OK line
    pub fn ok(&mut self, message: impl Into<String>) {
        self.push(LogTag::Ok, message);
    }

    /// Append a SKIP line
    pub fn skip(&mut self, message: impl Into<String>) {
        self.push(LogTag::Skip, message);
    }

    /// Append a FAIL line
    pub fn fail(&mut self, message: impl Into<String>) {
        self.push(LogTag::Fail, message);
    }

    /// Append an INFO line
    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LogTag::Info, message);
    }

    /// Append a CREATE line
    pub fn create(&mut self, message: impl Into<String>) {
        self.push(LogTag::Create, message);
    }

    /// Append an ASSIGN line
    pub fn assign(&mut self, message: impl Into<String>) {
        self.push(LogTag::Assign, message);
    }

    /// All lines, in order
    pub fn lines(&self) -> &[LogLine] {
        &self.lines
    }

    /// Number of lines carrying a tag
    pub fn count(&self, tag: LogTag) -> usize {
        self.lines.iter().filter(|line| line.tag == tag).count()
    }

    /// Number of lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// State of one conversion run, passed by reference through the
/// converter and executor and dropped when the run ends
#[derive(Debug)]
pub struct ConversionSession {
    run_id: Uuid,
    schema: Schema,
    pub(crate) cache: ConversionCache,
    /// Nodes whose upstream walk has not finished yet
    pub(crate) in_progress: HashSet<NodeRef>,
    pub(crate) log: TransferLog,
    /// Instancer colour node resolved for this run
    pub(crate) instancer_color: Option<NodeRef>,
    pub(crate) created: Vec<NodeRef>,
}

impl ConversionSession {
    /// Start a run converting into `schema`
    pub fn new(schema: Schema) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            schema,
            cache: ConversionCache::default(),
            in_progress: HashSet::new(),
            log: TransferLog::new(),
            instancer_color: None,
            created: Vec::new(),
        }
    }

    /// Run identifier
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Schema being converted into
    pub fn schema(&self) -> Schema {
        self.schema
    }

    /// Conversion cache
    pub fn cache(&self) -> &ConversionCache {
        &self.cache
    }

    /// Log so far
    pub fn log(&self) -> &TransferLog {
        &self.log
    }

    /// Nodes created so far
    pub fn created(&self) -> &[NodeRef] {
        &self.created
    }

    pub(crate) fn record_created(&mut self, node: NodeRef) {
        self.created.push(node);
    }

    /// Finish the run, keeping the log and created nodes
    pub fn finish(self) -> (TransferLog, Vec<NodeRef>) {
        (self.log, self.created)
    }
}
