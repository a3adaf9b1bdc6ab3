//! Remote/local pairing for each entity kind
//!
//! [`Reconcilable`] is what the upsert engine needs from a remote value:
//! its identity filter, its field matchers, its parent, and how to build or
//! refresh the local record. Matcher lists are built once per process.

use crate::filter::Filter;
use crate::identity;
use crate::matcher::{optional_eq, FieldMatcher, FieldMatchers};
use crate::model::{
    stored_precision, LocalEvent, LocalModel, LocalPerformance, LocalVenue, PerformanceLifecycle,
    RemoteEvent, RemotePerformance, RemoteVenue,
};
use crate::status::ReferenceId;
use once_cell::sync::Lazy;
use uuid::Uuid;

/// Parent that must exist before a record can be created
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentRef {
    Venue(String),
    Event(String),
}

/// A remote value the upsert engine can reconcile into the store
pub trait Reconcilable: Send + Sync + Sized + 'static {
    type Local: LocalModel;

    fn natural_key(&self) -> String;

    fn reference_id(&self) -> ReferenceId {
        ReferenceId::new(Self::Local::KIND, self.natural_key())
    }

    fn identity_filter(&self) -> Filter<Self::Local>;

    /// Structural equality over remote-owned fields
    fn field_matchers() -> &'static FieldMatchers<Self::Local, Self>;

    fn parent(&self) -> Option<ParentRef>;

    /// Fresh local record; `parent_id` is the resolved guid of [`Self::parent`]
    fn create_local(&self, parent_id: Option<Uuid>) -> Self::Local;

    /// Overwrite remote-owned, non-identity fields in place
    ///
    /// Must leave identity, parent links and local-only fields alone.
    fn update_local(&self, local: &mut Self::Local);
}

// ============================================================================
// Venue
// ============================================================================

static VENUE_MATCHERS: Lazy<FieldMatchers<LocalVenue, RemoteVenue>> = Lazy::new(|| {
    FieldMatchers::new(vec![
        FieldMatcher::field("code", |l: &LocalVenue| l.code.as_str(), |r: &RemoteVenue| r.code.as_str()),
        FieldMatcher::field("name", |l: &LocalVenue| l.name.as_str(), |r: &RemoteVenue| r.name.as_str()),
        FieldMatcher::optional("address", |l: &LocalVenue| l.address.as_deref(), |r: &RemoteVenue| r.address.as_deref()),
        FieldMatcher::optional("city", |l: &LocalVenue| l.city.as_deref(), |r: &RemoteVenue| r.city.as_deref()),
        FieldMatcher::optional("latitude", |l: &LocalVenue| l.latitude.as_ref(), |r: &RemoteVenue| r.latitude.as_ref()),
        FieldMatcher::optional("longitude", |l: &LocalVenue| l.longitude.as_ref(), |r: &RemoteVenue| r.longitude.as_ref()),
        FieldMatcher::optional("website", |l: &LocalVenue| l.website.as_deref(), |r: &RemoteVenue| r.website.as_deref()),
    ])
});

impl Reconcilable for RemoteVenue {
    type Local = LocalVenue;

    fn natural_key(&self) -> String {
        self.code.clone()
    }

    fn identity_filter(&self) -> Filter<LocalVenue> {
        identity::venue_by_code(&self.code)
    }

    fn field_matchers() -> &'static FieldMatchers<LocalVenue, Self> {
        &VENUE_MATCHERS
    }

    fn parent(&self) -> Option<ParentRef> {
        None
    }

    fn create_local(&self, _parent_id: Option<Uuid>) -> LocalVenue {
        LocalVenue {
            guid: Uuid::new_v4(),
            code: self.code.clone(),
            name: self.name.clone(),
            address: self.address.clone(),
            city: self.city.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            website: self.website.clone(),
        }
    }

    fn update_local(&self, local: &mut LocalVenue) {
        local.name = self.name.clone();
        local.address = self.address.clone();
        local.city = self.city.clone();
        local.latitude = self.latitude;
        local.longitude = self.longitude;
        local.website = self.website.clone();
    }
}

// ============================================================================
// Event
// ============================================================================

// venue_id, is_favourite and favourited_at are deliberately absent
static EVENT_MATCHERS: Lazy<FieldMatchers<LocalEvent, RemoteEvent>> = Lazy::new(|| {
    FieldMatchers::new(vec![
        FieldMatcher::field("code", |l: &LocalEvent| l.code.as_str(), |r: &RemoteEvent| r.code.as_str()),
        FieldMatcher::field("title", |l: &LocalEvent| l.title.as_str(), |r: &RemoteEvent| r.title.as_str()),
        FieldMatcher::optional("teaser", |l: &LocalEvent| l.teaser.as_deref(), |r: &RemoteEvent| r.teaser.as_deref()),
        FieldMatcher::optional("description", |l: &LocalEvent| l.description.as_deref(), |r: &RemoteEvent| r.description.as_deref()),
        FieldMatcher::optional("category", |l: &LocalEvent| l.category.as_deref(), |r: &RemoteEvent| r.category.as_deref()),
        FieldMatcher::optional("image_url", |l: &LocalEvent| l.image_url.as_deref(), |r: &RemoteEvent| r.image_url.as_deref()),
        FieldMatcher::optional("ticket_url", |l: &LocalEvent| l.ticket_url.as_deref(), |r: &RemoteEvent| r.ticket_url.as_deref()),
        FieldMatcher::optional("age_restriction", |l: &LocalEvent| l.age_restriction.as_deref(), |r: &RemoteEvent| r.age_restriction.as_deref()),
    ])
});

impl Reconcilable for RemoteEvent {
    type Local = LocalEvent;

    fn natural_key(&self) -> String {
        self.code.clone()
    }

    fn identity_filter(&self) -> Filter<LocalEvent> {
        identity::event_by_code(&self.code)
    }

    fn field_matchers() -> &'static FieldMatchers<LocalEvent, Self> {
        &EVENT_MATCHERS
    }

    fn parent(&self) -> Option<ParentRef> {
        Some(ParentRef::Venue(self.venue.code.clone()))
    }

    fn create_local(&self, parent_id: Option<Uuid>) -> LocalEvent {
        debug_assert!(parent_id.is_some(), "event {} created without venue", self.code);
        LocalEvent {
            guid: Uuid::new_v4(),
            code: self.code.clone(),
            title: self.title.clone(),
            teaser: self.teaser.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            image_url: self.image_url.clone(),
            ticket_url: self.ticket_url.clone(),
            age_restriction: self.age_restriction.clone(),
            venue_id: parent_id.unwrap_or_else(Uuid::nil),
            is_favourite: false,
            favourited_at: None,
        }
    }

    fn update_local(&self, local: &mut LocalEvent) {
        local.title = self.title.clone();
        local.teaser = self.teaser.clone();
        local.description = self.description.clone();
        local.category = self.category.clone();
        local.image_url = self.image_url.clone();
        local.ticket_url = self.ticket_url.clone();
        local.age_restriction = self.age_restriction.clone();
    }
}

// ============================================================================
// Performance
// ============================================================================

// event_id and lifecycle are deliberately absent
static PERFORMANCE_MATCHERS: Lazy<FieldMatchers<LocalPerformance, RemotePerformance>> =
    Lazy::new(|| {
        FieldMatchers::new(vec![
            FieldMatcher::field("event_code", |l: &LocalPerformance| l.event_code.as_str(), |r: &RemotePerformance| r.event_code.as_str()),
            FieldMatcher::from_fn("starts_at", |l: &LocalPerformance, r: &RemotePerformance| {
                l.starts_at == stored_precision(r.starts_at)
            }),
            FieldMatcher::from_fn("ends_at", |l: &LocalPerformance, r: &RemotePerformance| {
                optional_eq(l.ends_at.as_ref(), r.ends_at.map(stored_precision).as_ref())
            }),
            FieldMatcher::field("listing_status", |l: &LocalPerformance| &l.listing_status, |r: &RemotePerformance| &r.listing_status),
            FieldMatcher::optional("ticket_url", |l: &LocalPerformance| l.ticket_url.as_deref(), |r: &RemotePerformance| r.ticket_url.as_deref()),
            FieldMatcher::optional("price_info", |l: &LocalPerformance| l.price_info.as_deref(), |r: &RemotePerformance| r.price_info.as_deref()),
        ])
    });

impl Reconcilable for RemotePerformance {
    type Local = LocalPerformance;

    fn natural_key(&self) -> String {
        identity::performance_key(&self.event_code, self.starts_at)
    }

    fn identity_filter(&self) -> Filter<LocalPerformance> {
        identity::performance_by_key(&self.event_code, self.starts_at)
    }

    fn field_matchers() -> &'static FieldMatchers<LocalPerformance, Self> {
        &PERFORMANCE_MATCHERS
    }

    fn parent(&self) -> Option<ParentRef> {
        Some(ParentRef::Event(self.event_code.clone()))
    }

    fn create_local(&self, parent_id: Option<Uuid>) -> LocalPerformance {
        debug_assert!(
            parent_id.is_some(),
            "performance {} created without event",
            self.natural_key()
        );
        LocalPerformance {
            guid: Uuid::new_v4(),
            event_code: self.event_code.clone(),
            starts_at: stored_precision(self.starts_at),
            ends_at: self.ends_at.map(stored_precision),
            listing_status: self.listing_status,
            ticket_url: self.ticket_url.clone(),
            price_info: self.price_info.clone(),
            event_id: parent_id.unwrap_or_else(Uuid::nil),
            lifecycle: PerformanceLifecycle::Active,
        }
    }

    fn update_local(&self, local: &mut LocalPerformance) {
        local.ends_at = self.ends_at.map(stored_precision);
        local.listing_status = self.listing_status;
        local.ticket_url = self.ticket_url.clone();
        local.price_info = self.price_info.clone();
    }
}
