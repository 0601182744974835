//! Domain types for the festival-detail screen.
//!
//! Everything here mirrors the backend's JSON wire shapes (camelCase field
//! names) and is replaced wholesale on each fetch. Nothing in this module
//! talks to the network.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a festival
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FestivalId(i64);

impl FestivalId {
    /// Creates a `FestivalId` from a raw backend id
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw id
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for FestivalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a user account
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(i64);

impl AccountId {
    /// Creates an `AccountId` from a raw backend id
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw id
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a review
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReviewId(i64);

impl ReviewId {
    /// Creates a `ReviewId` from a raw backend id
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw id
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for ReviewId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a festival
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FestivalStatus {
    /// Created but not yet visible to students
    Draft,
    /// Open for browsing and registration
    Published,
    /// Currently running
    Ongoing,
    /// Finished
    Completed,
    /// Called off
    Cancelled,
}

/// A gallery image attached to a festival
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FestivalImage {
    /// Image id
    pub image_id: i64,
    /// Public URL of the image
    pub image_url: String,
    /// Original file name
    pub image_name: String,
    /// Owning festival
    pub festival_id: i64,
}

/// A named spot on a festival map
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapLocation {
    /// Location id
    pub location_id: i64,
    /// Owning map
    pub map_id: i64,
    /// Display name
    pub location_name: String,
    /// Kind of spot (booth slot, stage, entrance, ...)
    pub location_type: String,
    /// Whether a booth already claimed this spot
    pub is_occupied: bool,
    /// Free-form coordinates on the map image
    pub coordinates: String,
}

/// A venue map attached to a festival
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FestivalMap {
    /// Map id
    pub map_id: i64,
    /// Owning festival
    pub festival_id: i64,
    /// Display name
    pub map_name: String,
    /// Kind of map
    pub map_type: String,
    /// Public URL of the map image
    pub map_url: String,
    /// Spots on this map
    #[serde(default)]
    pub locations: Vec<MapLocation>,
}

/// Whether a menu item is food or a beverage
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuItemKind {
    /// Food item
    Food,
    /// Beverage item
    Beverage,
}

/// A single item on a festival menu
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    /// Item id
    pub item_id: i64,
    /// Owning menu
    pub menu_id: i64,
    /// Display name
    pub item_name: String,
    /// Description shown under the name
    #[serde(default)]
    pub description: String,
    /// Food or beverage
    pub item_type: MenuItemKind,
    /// Lower price bound
    pub min_price: f64,
    /// Upper price bound
    pub max_price: f64,
}

/// A menu attached to a festival
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FestivalMenu {
    /// Menu id
    pub menu_id: i64,
    /// Owning festival
    pub festival_id: i64,
    /// Display name
    pub menu_name: String,
    /// Description shown under the name
    #[serde(default)]
    pub description: String,
    /// Items on this menu
    #[serde(default, rename = "menuItems")]
    pub items: Vec<MenuItem>,
}

/// Full festival snapshot as returned by the detail endpoint.
///
/// Immutable per fetch: the screen replaces the whole value on reload and
/// never mutates individual fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Festival {
    /// Festival id
    pub festival_id: FestivalId,
    /// Hosting school
    pub school_id: i64,
    /// Display name
    pub festival_name: String,
    /// Theme line shown under the name
    #[serde(default)]
    pub theme: String,
    /// Long description
    #[serde(default)]
    pub description: String,
    /// Lifecycle status
    pub status: FestivalStatus,
    /// When the festival starts
    pub start_date: DateTime<Utc>,
    /// When the festival ends
    pub end_date: DateTime<Utc>,
    /// When participant registration opens
    pub registration_start_date: DateTime<Utc>,
    /// When participant registration closes
    pub registration_end_date: DateTime<Utc>,
    /// Venue address
    #[serde(default)]
    pub location: String,
    /// Maximum food booths
    pub max_food_booths: u32,
    /// Maximum beverage booths
    pub max_beverage_booths: u32,
    /// Food booths registered so far
    pub registered_food_booths: u32,
    /// Beverage booths registered so far
    pub registered_beverage_booths: u32,
    /// Participants registered so far
    pub total_registered_participants: u32,
    /// Reason shown when status is cancelled
    #[serde(default)]
    pub cancellation_reason: Option<String>,
    /// Gallery images
    #[serde(default)]
    pub images: Vec<FestivalImage>,
    /// Venue maps
    #[serde(default, rename = "festivalMaps")]
    pub maps: Vec<FestivalMap>,
    /// Menus
    #[serde(default, rename = "festivalMenus")]
    pub menus: Vec<FestivalMenu>,
}

/// A star rating with comment, attached to a festival by one account.
///
/// The backend enforces at most one review per (festival, account) pair;
/// the client relies on that to locate "my review" by scanning the list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Review id. Some backend responses omit it, so list rendering must
    /// not depend on its presence (see [`Review::render_key`]).
    #[serde(default)]
    pub id: Option<ReviewId>,
    /// Festival being reviewed
    pub festival_id: FestivalId,
    /// Author account
    pub account_id: AccountId,
    /// Star rating, 1-5
    pub rating: u8,
    /// Free-text comment, may be empty
    #[serde(default)]
    pub comment: String,
    /// When the review was created
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// When the review was last updated
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Whether the review has been edited since creation
    #[serde(default, rename = "isEdit")]
    pub is_edit: bool,
}

impl Review {
    /// Stable key for list rendering.
    ///
    /// Falls back to a composite of author, festival and timestamp when the
    /// backend omitted the id. Duplicate or missing ids would otherwise
    /// break list diffing, so this is a correctness requirement rather than
    /// a presentation nicety.
    #[must_use]
    pub fn render_key(&self) -> ReviewKey {
        self.id.map_or(
            ReviewKey::Composite {
                account_id: self.account_id,
                festival_id: self.festival_id,
                timestamp: self.created_at.or(self.updated_at),
            },
            ReviewKey::Id,
        )
    }

    /// Timestamp shown next to the review (prefers the edit time)
    #[must_use]
    pub fn displayed_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at.or(self.created_at)
    }
}

/// Stable identity of a review row for list rendering
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReviewKey {
    /// Backend-assigned id
    Id(ReviewId),
    /// Fallback when the backend omitted the id
    Composite {
        /// Author account
        account_id: AccountId,
        /// Festival being reviewed
        festival_id: FestivalId,
        /// Creation (or edit) timestamp
        timestamp: Option<DateTime<Utc>>,
    },
}

/// Payload for creating a new review
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    /// Festival being reviewed
    pub festival_id: FestivalId,
    /// Author account
    pub account_id: AccountId,
    /// Star rating, 1-5
    pub rating: u8,
    /// Free-text comment, may be empty
    pub comment: String,
}

/// Display profile of a review author, resolved from an account id
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorProfile {
    /// Account the profile belongs to
    pub account_id: AccountId,
    /// Name shown on review rows
    pub display_name: String,
    /// Avatar shown on review rows
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl AuthorProfile {
    /// Placeholder profile used when a lookup fails.
    ///
    /// Marks the slot resolved so the row renders and the id is not
    /// re-fetched within the screen session.
    #[must_use]
    pub fn placeholder(account_id: AccountId) -> Self {
        Self {
            account_id,
            display_name: format!("User #{account_id}"),
            avatar_url: None,
        }
    }
}

/// Who authored a review row, relative to the current session.
///
/// Computed once per row from an account-id comparison and consumed
/// uniformly by rendering and action gating (only `Myself` rows expose
/// edit/delete controls).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reviewer {
    /// The signed-in user wrote this review
    Myself,
    /// Someone else wrote this review
    Other,
}

/// Identity of the screen session: which festival, and who is looking.
///
/// Passed explicitly into the engine's initial state; there is no ambient
/// auth global. `account_id` is `None` for guests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionContext {
    /// Festival the screen shows
    pub festival_id: FestivalId,
    /// Signed-in account, if any
    pub account_id: Option<AccountId>,
}

impl SessionContext {
    /// Creates a session for the given festival and viewer
    #[must_use]
    pub const fn new(festival_id: FestivalId, account_id: Option<AccountId>) -> Self {
        Self {
            festival_id,
            account_id,
        }
    }

    /// Whether the viewer is not signed in
    #[must_use]
    pub const fn is_guest(&self) -> bool {
        self.account_id.is_none()
    }

    /// Classifies a review author relative to this session
    #[must_use]
    pub fn reviewer_of(&self, author: AccountId) -> Reviewer {
        if self.account_id == Some(author) {
            Reviewer::Myself
        } else {
            Reviewer::Other
        }
    }
}

/// Load lifecycle of an independently fetched resource.
///
/// The three initial loads complete in any order, so the screen renders
/// whatever subset is available; a failure in one never blocks the others.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum Loadable<T> {
    /// Not requested yet
    #[default]
    Idle,
    /// Request in flight
    Loading,
    /// Last fetch succeeded
    Loaded(T),
    /// Last fetch failed
    Failed(String),
}

impl<T> Loadable<T> {
    /// The loaded value, if any
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Loadable::Loaded(value) => Some(value),
            _ => None,
        }
    }

    /// Whether a request is in flight
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Loadable::Loading)
    }
}
