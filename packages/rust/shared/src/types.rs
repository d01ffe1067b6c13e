//! Core domain types for ContentForge runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// ItemId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for work-item identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub Uuid);

impl ItemId {
    /// Generate a new time-sortable item identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ItemId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// ItemStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a work item inside the pipeline.
///
/// `Completed` and `Error` are terminal; `Error` is only reached after the
/// retry budget is exhausted or a non-retryable mismatch is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    Analyzing,
    Generating,
    Completed,
    Error,
}

impl ItemStatus {
    /// Whether the item can still make forward progress.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Analyzing => "analyzing",
            Self::Generating => "generating",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ContentScope
// ---------------------------------------------------------------------------

/// Which content fields a run produces for each item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentScope {
    /// Titles only.
    Title,
    /// Body descriptions only.
    Description,
    /// Both title and description.
    #[default]
    TitleAndDescription,
}

impl ContentScope {
    pub fn wants_title(&self) -> bool {
        matches!(self, Self::Title | Self::TitleAndDescription)
    }

    pub fn wants_description(&self) -> bool {
        matches!(self, Self::Description | Self::TitleAndDescription)
    }
}

// ---------------------------------------------------------------------------
// PublishMode
// ---------------------------------------------------------------------------

/// How a published resource becomes visible on the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishMode {
    /// Created hidden; published manually later.
    #[default]
    Draft,
    /// Visible immediately.
    Active,
    /// Visible at a scheduled future timestamp.
    Scheduled,
}

// ---------------------------------------------------------------------------
// Cost accounting
// ---------------------------------------------------------------------------

/// Per-stage cost and token accounting, additive across items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostMetrics {
    /// Dollar cost of the analysis stage.
    pub analysis_cost: f64,
    /// Dollar cost of the writing stage.
    pub generation_cost: f64,
    /// Total input tokens across both stages.
    pub tokens_in: u64,
    /// Total output tokens across both stages.
    pub tokens_out: u64,
}

impl CostMetrics {
    /// Combined dollar cost of both stages.
    pub fn total_cost(&self) -> f64 {
        self.analysis_cost + self.generation_cost
    }

    /// Fold another metrics record into this one.
    pub fn absorb(&mut self, other: &CostMetrics) {
        self.analysis_cost += other.analysis_cost;
        self.generation_cost += other.generation_cost;
        self.tokens_in += other.tokens_in;
        self.tokens_out += other.tokens_out;
    }
}

// ---------------------------------------------------------------------------
// GeneratedContent
// ---------------------------------------------------------------------------

/// Output of a completed pipeline pass over one item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratedContent {
    /// Generated title, when the run scope includes titles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Generated body HTML, when the run scope includes descriptions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_html: Option<String>,
    /// Intermediate analysis text produced by the first stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    /// Cost accounting for this item.
    #[serde(default)]
    pub costs: CostMetrics,
}

// ---------------------------------------------------------------------------
// WorkItem
// ---------------------------------------------------------------------------

/// One unit of content moving through the pipeline.
///
/// Created when added to a run; mutated only by the pipeline executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    /// Unique item identifier (UUID v7).
    pub id: ItemId,
    /// Global index in the flattened run queue.
    pub index: usize,
    /// Owning group.
    pub group_id: String,
    /// Position within the owning group.
    pub position: usize,
    /// Input subject (product title, article keyword, ...).
    pub subject: String,
    /// Optional source image reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Target locale for generated content.
    pub locale: String,
    /// Current pipeline state.
    pub status: ItemStatus,
    /// Number of generation attempts so far.
    pub attempts: u32,
    /// Result payload, present once generation completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<GeneratedContent>,
    /// Last recorded error message, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl WorkItem {
    /// Create a fresh pending item. Group membership and indices are
    /// assigned when the item is attached to a [`Group`] and enqueued.
    pub fn new(subject: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(),
            index: 0,
            group_id: String::new(),
            position: 0,
            subject: subject.into(),
            image_url: None,
            locale: locale.into(),
            status: ItemStatus::Pending,
            attempts: 0,
            result: None,
            last_error: None,
        }
    }

    /// Attach a source image reference.
    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Group
// ---------------------------------------------------------------------------

/// A caller-defined cluster of work items sharing an internal-linking scope.
///
/// Items keep their relative order for the lifetime of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    /// Stable group identifier.
    pub id: String,
    /// Link handle used when building URLs to items in this group.
    pub handle: String,
    /// Ordered member items. Must be non-empty for a valid run.
    pub items: Vec<WorkItem>,
}

impl Group {
    /// Create a group and stamp group membership onto its items.
    pub fn new(
        id: impl Into<String>,
        handle: impl Into<String>,
        mut items: Vec<WorkItem>,
    ) -> Self {
        let id = id.into();
        for (position, item) in items.iter_mut().enumerate() {
            item.group_id = id.clone();
            item.position = position;
        }
        Self {
            id,
            handle: handle.into(),
            items,
        }
    }

    /// Convenience constructor from bare subjects.
    pub fn from_subjects(
        id: impl Into<String>,
        handle: impl Into<String>,
        subjects: &[&str],
        locale: &str,
    ) -> Self {
        let items = subjects
            .iter()
            .map(|s| WorkItem::new(*s, locale))
            .collect();
        Self::new(id, handle, items)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ---------------------------------------------------------------------------
// PriceRule
// ---------------------------------------------------------------------------

/// A half-open price band `[min_price, max_price)` with its multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRule {
    pub min_price: f64,
    pub max_price: f64,
    pub multiplier: f64,
}

impl PriceRule {
    pub fn new(min_price: f64, max_price: f64, multiplier: f64) -> Self {
        Self {
            min_price,
            max_price,
            multiplier,
        }
    }

    /// Whether a price falls inside this band.
    pub fn contains(&self, price: f64) -> bool {
        price >= self.min_price && price < self.max_price
    }
}

/// A single publish timestamp assigned to a run item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Index of the item in the scheduled sequence.
    pub item_index: usize,
    /// Target publication timestamp.
    pub publish_at: DateTime<Utc>,
    /// Whether this entry publishes "now" rather than on a future day.
    pub immediate: bool,
}
