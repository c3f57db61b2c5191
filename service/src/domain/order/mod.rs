//! [`Order`] definitions.

mod status;

use common::{unit, DateTime, DateTimeOf, Price};
use derive_more::{AsRef, Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    carrier::{self, Plate},
    company, destination, user,
};

pub use self::status::Status;

/// Freight order of a shipping company, fulfilled by a carrier.
///
/// Its [`Status`] and the related timestamps change only through
/// [`Order::apply()`]ing a [`Transition`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Order {
    /// ID of this [`Order`].
    pub id: Id,

    /// ID of the company requesting this [`Order`].
    pub company_id: company::Id,

    /// ID of the carrier this [`Order`] is assigned to.
    pub carrier_id: carrier::Id,

    /// ID of the destination this [`Order`] is delivered to.
    pub destination_id: destination::Id,

    /// [`LoadingWindow`] of this [`Order`].
    pub window: LoadingWindow,

    /// Fuel price locked in when this [`Order`] was created.
    pub fuel_price: Price,

    /// [`DateTime`] when this [`Order`] was created.
    pub created_at: CreationDateTime,

    /// [`Plate`] of the truck submitted for this [`Order`].
    plate: Option<Plate>,

    /// [`Status`] of this [`Order`].
    status: Status,

    /// [`DateTime`] when a truck was submitted for this [`Order`].
    truck_submitted_at: Option<TruckSubmissionDateTime>,

    /// [`DateTime`] when this [`Order`] was finished.
    finished_at: Option<CompletionDateTime>,

    /// [`Cancellation`] details of this [`Order`].
    cancellation: Option<Cancellation>,
}

impl Order {
    /// Creates a new [`Status::INITIAL`] [`Order`].
    #[must_use]
    pub fn new(
        company_id: company::Id,
        carrier_id: carrier::Id,
        destination_id: destination::Id,
        window: LoadingWindow,
        fuel_price: Price,
    ) -> Self {
        Self {
            id: Id::new(),
            company_id,
            carrier_id,
            destination_id,
            window,
            fuel_price,
            created_at: DateTime::now().coerce(),
            plate: None,
            status: Status::INITIAL,
            truck_submitted_at: None,
            finished_at: None,
            cancellation: None,
        }
    }

    /// Restores an [`Order`] from its persisted [`State`].
    ///
    /// No [`Transition`] rules are checked, as the [`State`] is expected to
    /// be produced by them.
    #[must_use]
    pub(crate) fn restore(self, state: State) -> Self {
        let State {
            plate,
            status,
            truck_submitted_at,
            finished_at,
            cancellation,
        } = state;
        Self {
            plate,
            status,
            truck_submitted_at,
            finished_at,
            cancellation,
            ..self
        }
    }

    /// Returns the [`Plate`] of the truck submitted for this [`Order`].
    #[must_use]
    pub fn plate(&self) -> Option<&Plate> {
        self.plate.as_ref()
    }

    /// Returns the [`Status`] of this [`Order`].
    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Returns [`DateTime`] when a truck was submitted for this [`Order`].
    #[must_use]
    pub fn truck_submitted_at(&self) -> Option<TruckSubmissionDateTime> {
        self.truck_submitted_at
    }

    /// Returns [`DateTime`] when this [`Order`] was finished.
    #[must_use]
    pub fn finished_at(&self) -> Option<CompletionDateTime> {
        self.finished_at
    }

    /// Returns [`Cancellation`] details of this [`Order`], if it was
    /// cancelled.
    #[must_use]
    pub fn cancellation(&self) -> Option<&Cancellation> {
        self.cancellation.as_ref()
    }

    /// Returns the persisted [`State`] of this [`Order`].
    #[must_use]
    pub fn state(&self) -> State {
        State {
            plate: self.plate.clone(),
            status: self.status,
            truck_submitted_at: self.truck_submitted_at,
            finished_at: self.finished_at,
            cancellation: self.cancellation.clone(),
        }
    }

    /// Indicates whether this [`Order`] may still be deleted.
    #[must_use]
    pub fn is_deletable(&self) -> bool {
        self.status == Status::Pending
    }

    /// Applies the provided [`Transition`] to this [`Order`] at the `now`
    /// moment.
    ///
    /// # Errors
    ///
    /// With a [`TransitionError`] if the [`Transition`] is not allowed from
    /// the current [`Status`]. This [`Order`] is left untouched then.
    pub fn apply(
        &mut self,
        transition: Transition,
        now: DateTime,
    ) -> Result<(), TransitionError> {
        let (from, to) = (self.status, transition.target());
        if !from.can_transition_to(to) {
            return Err(TransitionError { from, to });
        }

        match transition {
            Transition::Approve { plate } => {
                self.plate = Some(plate);
                self.truck_submitted_at = Some(now.coerce());
            }
            Transition::Finish => {
                self.finished_at = Some(now.coerce());
            }
            Transition::Cancel { reason, by } => {
                self.cancellation = Some(Cancellation {
                    at: now.coerce(),
                    reason,
                    by,
                });
            }
        }
        self.status = to;

        Ok(())
    }
}

/// Lifecycle part of an [`Order`], owned by its [`Transition`]s.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct State {
    /// [`Plate`] of the submitted truck.
    pub plate: Option<Plate>,

    /// Current [`Status`].
    pub status: Status,

    /// [`DateTime`] when a truck was submitted.
    pub truck_submitted_at: Option<TruckSubmissionDateTime>,

    /// [`DateTime`] when the [`Order`] was finished.
    pub finished_at: Option<CompletionDateTime>,

    /// [`Cancellation`] details.
    pub cancellation: Option<Cancellation>,
}

/// Change of an [`Order`]'s [`Status`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Transition {
    /// Truck with the provided [`Plate`] is submitted.
    Approve {
        /// [`Plate`] of the submitted truck.
        plate: Plate,
    },

    /// [`Order`] is delivered.
    Finish,

    /// [`Order`] is cancelled.
    Cancel {
        /// [`Reason`] of the cancellation.
        reason: Reason,

        /// [`Actor`] cancelling the [`Order`].
        by: Actor,
    },
}

impl Transition {
    /// Returns the [`Status`] this [`Transition`] leads to.
    #[must_use]
    pub fn target(&self) -> Status {
        match self {
            Self::Approve { .. } => Status::Approved,
            Self::Finish => Status::Finished,
            Self::Cancel { .. } => Status::Cancelled,
        }
    }
}

/// Error of [`Order::apply()`]ing a disallowed [`Transition`].
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
#[display("`Order` cannot transition from `{from}` to `{to}`")]
pub struct TransitionError {
    /// [`Status`] the [`Order`] is in.
    pub from: Status,

    /// [`Status`] the [`Order`] was requested to transition to.
    pub to: Status,
}

/// Loading time window of an [`Order`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LoadingWindow {
    /// [`DateTime`] when loading starts.
    starts_at: LoadingDateTime,

    /// [`DateTime`] when loading ends.
    ends_at: LoadingDateTime,
}

impl LoadingWindow {
    /// Creates a new [`LoadingWindow`] if it `starts_at` strictly before it
    /// `ends_at`.
    #[must_use]
    pub fn new(
        starts_at: LoadingDateTime,
        ends_at: LoadingDateTime,
    ) -> Option<Self> {
        (starts_at < ends_at).then_some(Self { starts_at, ends_at })
    }

    /// Returns [`DateTime`] when loading starts.
    #[must_use]
    pub fn starts_at(&self) -> LoadingDateTime {
        self.starts_at
    }

    /// Returns [`DateTime`] when loading ends.
    #[must_use]
    pub fn ends_at(&self) -> LoadingDateTime {
        self.ends_at
    }

    /// Indicates whether this [`LoadingWindow`] shares at least one instant
    /// with the `other` one, boundaries included.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.starts_at <= other.ends_at && self.ends_at >= other.starts_at
    }
}

/// Details of an [`Order`] cancellation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Cancellation {
    /// [`DateTime`] when the [`Order`] was cancelled.
    pub at: CancellationDateTime,

    /// [`Reason`] of the cancellation.
    pub reason: Reason,

    /// [`Actor`] who cancelled the [`Order`].
    pub by: Actor,
}

/// Initiator of an [`Order`] [`Transition`].
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Actor {
    /// Platform user.
    #[display("User(id: {_0})")]
    User(user::Id),

    /// The system itself, acting on a schedule.
    #[display("System")]
    System,
}

impl Actor {
    /// Returns ID of the user behind this [`Actor`], if any.
    #[must_use]
    pub fn user_id(self) -> Option<user::Id> {
        match self {
            Self::User(id) => Some(id),
            Self::System => None,
        }
    }
}

impl From<Option<user::Id>> for Actor {
    fn from(id: Option<user::Id>) -> Self {
        id.map_or(Self::System, Self::User)
    }
}

/// Reason of an [`Order`] cancellation.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Reason(String);

impl Reason {
    /// [`Reason`] of cancelling an [`Order`] left without a truck for too
    /// long.
    pub const EXPIRED: &'static str =
        "auto-cancelled: expired without truck submission";

    /// Creates a new [`Reason`] if the given `reason` is valid.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Option<Self> {
        let reason = reason.into();
        Self::check(&reason).then_some(Self(reason))
    }

    /// Returns the [`Reason::EXPIRED`] one.
    #[must_use]
    pub fn expired() -> Self {
        Self(Self::EXPIRED.into())
    }

    /// Checks whether the given `reason` is a valid [`Reason`].
    fn check(reason: impl AsRef<str>) -> bool {
        let reason = reason.as_ref();
        reason.trim() == reason && !reason.is_empty() && reason.len() <= 1024
    }
}

impl FromStr for Reason {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Reason`")
    }
}

/// ID of an [`Order`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Notification about an [`Order`] change.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Event {
    /// [`Order`] was created.
    #[display("`Order(id: {id})` created for `Carrier(id: {carrier_id})`")]
    Created {
        /// ID of the created [`Order`].
        id: Id,

        /// ID of the carrier the [`Order`] is assigned to.
        carrier_id: carrier::Id,
    },

    /// [`Order`] changed its [`Status`].
    #[display("`Order(id: {id})` transitioned from `{from}` to `{to}`")]
    Transitioned {
        /// ID of the transitioned [`Order`].
        id: Id,

        /// ID of the carrier the [`Order`] is assigned to.
        carrier_id: carrier::Id,

        /// Previous [`Status`].
        from: Status,

        /// New [`Status`].
        to: Status,
    },

    /// [`Order`] was deleted.
    #[display("`Order(id: {id})` deleted")]
    Deleted {
        /// ID of the deleted [`Order`].
        id: Id,
    },
}

/// Marker type indicating a truck submission for an [`Order`].
#[derive(Clone, Copy, Debug)]
pub struct TruckSubmission;

/// Marker type indicating an [`Order`] loading.
#[derive(Clone, Copy, Debug)]
pub struct Loading;

/// [`DateTime`] when an [`Order`] was created.
pub type CreationDateTime = DateTimeOf<(Order, unit::Creation)>;

/// [`DateTime`] bounding a [`LoadingWindow`].
pub type LoadingDateTime = DateTimeOf<(Order, Loading)>;

/// [`DateTime`] when a truck was submitted for an [`Order`].
pub type TruckSubmissionDateTime = DateTimeOf<(Order, TruckSubmission)>;

/// [`DateTime`] when an [`Order`] was finished.
pub type CompletionDateTime = DateTimeOf<(Order, unit::Completion)>;

/// [`DateTime`] when an [`Order`] was cancelled.
pub type CancellationDateTime = DateTimeOf<(Order, unit::Cancellation)>;
