//! Envelope — the in-memory container handed to a Transport.
//!
//! One envelope carries one or more items (an event plus its attachments, a
//! session, a check-in, a client report). The on-wire byte format is the
//! transport's concern; this type is only the hand-off unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attachment::Attachment;
use crate::checkin::{CheckIn, MonitorConfig};
use crate::event::{Event, EventId};
use crate::report::{ClientReport, DataCategory};
use crate::session::Session;
use crate::trace::DynamicSamplingContext;

/// A single payload inside an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "item")]
pub enum EnvelopeItem {
    Event(Event),
    Session(Session),
    CheckIn {
        check_in: CheckIn,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        monitor_config: Option<MonitorConfig>,
    },
    Attachment(Attachment),
    ClientReport(ClientReport),
}

impl EnvelopeItem {
    /// The accounting category this item falls under.
    pub fn category(&self) -> DataCategory {
        match self {
            EnvelopeItem::Event(_) => DataCategory::Error,
            EnvelopeItem::Session(_) => DataCategory::Session,
            EnvelopeItem::CheckIn { .. } => DataCategory::CheckIn,
            EnvelopeItem::Attachment(_) => DataCategory::Attachment,
            EnvelopeItem::ClientReport(_) => DataCategory::Internal,
        }
    }
}

/// The delivery container accepted by [`Transport`](crate::transport::Transport).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Id of the event this envelope was built for, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<EventId>,

    pub sent_at: DateTime<Utc>,

    /// Trace header propagated for sampling decisions downstream
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<DynamicSamplingContext>,

    pub items: Vec<EnvelopeItem>,
}

impl Envelope {
    /// Create an empty envelope stamped with the current time.
    pub fn new() -> Self {
        Self {
            event_id: None,
            sent_at: Utc::now(),
            trace: None,
            items: Vec::new(),
        }
    }

    /// Build an envelope around an event and its attachments.
    pub fn from_event(event: Event, attachments: Vec<Attachment>) -> Self {
        let mut envelope = Self::new();
        envelope.event_id = Some(event.event_id);
        envelope.items.push(EnvelopeItem::Event(event));
        envelope
            .items
            .extend(attachments.into_iter().map(EnvelopeItem::Attachment));
        envelope
    }

    pub fn add_item(&mut self, item: EnvelopeItem) {
        self.items.push(item);
    }

    /// The event carried by this envelope, if any.
    pub fn event(&self) -> Option<&Event> {
        self.items.iter().find_map(|item| match item {
            EnvelopeItem::Event(event) => Some(event),
            _ => None,
        })
    }

    /// Accounting categories of every item, in order.
    pub fn categories(&self) -> Vec<DataCategory> {
        self.items.iter().map(EnvelopeItem::category).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new()
    }
}
