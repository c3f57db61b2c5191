//! [`Order`] read model definitions.

use derive_more::{Deref, Display, From, Into};

use crate::domain::{
    carrier::{self, Plate},
    company, destination,
    order::{self, LoadingWindow, Status},
    Order,
};

/// Wrapper around an [`Order`] indicating that it's in the
/// [`Status::Pending`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pending<T>(pub T);

impl<T> Pending<T> {
    /// Unwraps this [`Pending`] entity.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

/// Criteria of searching [`Order`]s assigned to a carrier.
///
/// Unset criteria match any [`Order`]. Found [`Order`]s are ordered from the
/// most recently created one.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Criteria {
    /// ID of the carrier the [`Order`]s are assigned to.
    pub carrier_id: carrier::Id,

    /// [`Status`] of the [`Order`]s.
    pub status: Option<Status>,

    /// ID of the company requesting the [`Order`]s.
    pub company_id: Option<company::Id>,

    /// ID of the destination of the [`Order`]s.
    pub destination_id: Option<destination::Id>,

    /// Part of the submitted truck [`Plate`], matched case-insensitively.
    pub plate: Option<String>,

    /// Earliest creation [`DateTime`], inclusive.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_from: Option<order::CreationDateTime>,

    /// Latest creation [`DateTime`], inclusive.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_to: Option<order::CreationDateTime>,
}

impl Criteria {
    /// Creates new [`Criteria`] matching every [`Order`] of the carrier.
    #[must_use]
    pub fn new(carrier_id: carrier::Id) -> Self {
        Self {
            carrier_id,
            status: None,
            company_id: None,
            destination_id: None,
            plate: None,
            created_from: None,
            created_to: None,
        }
    }

    /// Returns the normalized [`Plate`] part to search by, if any.
    ///
    /// Blank parts are ignored.
    #[must_use]
    pub fn plate_part(&self) -> Option<String> {
        self.plate
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_uppercase)
    }

    /// Indicates whether the provided [`Order`] satisfies these [`Criteria`].
    #[must_use]
    pub fn matches(&self, order: &Order) -> bool {
        let plate_matches = self.plate_part().is_none_or(|part| {
            order.plate().is_some_and(|p| {
                AsRef::<str>::as_ref(p).to_uppercase().contains(&part)
            })
        });

        order.carrier_id == self.carrier_id
            && self.status.is_none_or(|s| order.status() == s)
            && self.company_id.is_none_or(|id| order.company_id == id)
            && self.destination_id.is_none_or(|id| order.destination_id == id)
            && self.created_from.is_none_or(|from| order.created_at >= from)
            && self.created_to.is_none_or(|to| order.created_at <= to)
            && plate_matches
    }
}

/// Truck of a carrier, identified by its [`Plate`].
#[derive(Clone, Debug, Display, Eq, Hash, PartialEq)]
#[display("`Truck(carrier_id: {carrier_id}, plate: {plate})`")]
pub struct Truck {
    /// ID of the carrier owning the truck.
    pub carrier_id: carrier::Id,

    /// [`Plate`] of the truck.
    pub plate: Plate,
}

/// Intention to use a [`Truck`] during a [`LoadingWindow`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlateClaim {
    /// Claimed [`Truck`].
    pub truck: Truck,

    /// [`LoadingWindow`] the [`Truck`] is claimed for.
    pub window: LoadingWindow,

    /// ID of the [`Order`] making this [`PlateClaim`], so it doesn't conflict
    /// with itself.
    pub except: Option<order::Id>,
}

impl PlateClaim {
    /// Indicates whether the provided [`Order`] already holds the claimed
    /// [`Truck`] for an overlapping [`LoadingWindow`].
    #[must_use]
    pub fn conflicts_with(&self, order: &Order) -> bool {
        Some(order.id) != self.except
            && order.carrier_id == self.truck.carrier_id
            && order.plate() == Some(&self.truck.plate)
            && !order.status().is_terminal()
            && order.window.overlaps(&self.window)
    }
}

/// Result of checking a [`PlateClaim`].
#[derive(Clone, Copy, Debug, Deref, Eq, From, Into, PartialEq)]
pub struct PlateAvailable(bool);

/// [`Order`] counts of a carrier by their [`Status`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Stats {
    /// Number of [`Status::Pending`] [`Order`]s.
    pub pending: u64,

    /// Number of [`Status::Approved`] [`Order`]s.
    pub approved: u64,

    /// Number of [`Status::Finished`] [`Order`]s.
    pub finished: u64,

    /// Number of [`Status::Cancelled`] [`Order`]s.
    pub cancelled: u64,
}

impl Stats {
    /// Accounts one more [`Order`] in the provided [`Status`].
    pub fn count(&mut self, status: Status) {
        self.add(status, 1);
    }

    /// Accounts `n` more [`Order`]s in the provided [`Status`].
    pub fn add(&mut self, status: Status, n: u64) {
        let counter = match status {
            Status::Pending => &mut self.pending,
            Status::Approved => &mut self.approved,
            Status::Finished => &mut self.finished,
            Status::Cancelled => &mut self.cancelled,
        };
        *counter += n;
    }

    /// Total number of [`Order`]s.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.pending + self.approved + self.finished + self.cancelled
    }

    /// Percentage of [`Status::Finished`] [`Order`]s among all of them.
    ///
    /// [`None`] if there are no [`Order`]s at all.
    #[expect(clippy::cast_precision_loss, reason = "percentage")]
    #[must_use]
    pub fn completion_rate(&self) -> Option<f64> {
        let total = self.total();
        (total > 0).then(|| self.finished as f64 * 100.0 / total as f64)
    }
}

#[cfg(test)]
mod spec {
    use common::DateTime;

    use crate::{
        domain::{
            carrier::Plate,
            order::{Actor, Reason, Status, Transition},
            Order,
        },
        fixtures,
    };

    use super::{PlateClaim, Stats, Truck};

    fn approved(plate: &str, from_days: u32, to_days: u32) -> Order {
        let mut order = fixtures::order();
        order.window = fixtures::window(from_days, to_days);
        order
            .apply(
                Transition::Approve {
                    plate: Plate::new(plate).unwrap(),
                },
                DateTime::now(),
            )
            .unwrap();
        order
    }

    fn claim_for(order: &Order, from_days: u32, to_days: u32) -> PlateClaim {
        PlateClaim {
            truck: Truck {
                carrier_id: order.carrier_id,
                plate: order.plate().unwrap().clone(),
            },
            window: fixtures::window(from_days, to_days),
            except: None,
        }
    }

    #[test]
    fn conflicts_on_overlap() {
        let existing = approved("ABC-123", 2, 4);

        assert!(claim_for(&existing, 3, 5).conflicts_with(&existing));
        assert!(claim_for(&existing, 4, 6).conflicts_with(&existing));
        assert!(!claim_for(&existing, 5, 6).conflicts_with(&existing));
    }

    #[test]
    fn ignores_other_trucks_and_itself() {
        let existing = approved("ABC-123", 2, 4);

        let mut claim = claim_for(&existing, 2, 4);
        claim.truck.plate = Plate::new("XYZ-999").unwrap();
        assert!(!claim.conflicts_with(&existing));

        let mut claim = claim_for(&existing, 2, 4);
        claim.truck.carrier_id = fixtures::order().carrier_id;
        assert!(!claim.conflicts_with(&existing));

        let mut claim = claim_for(&existing, 2, 4);
        claim.except = Some(existing.id);
        assert!(!claim.conflicts_with(&existing));
    }

    #[test]
    fn ignores_terminal_orders() {
        let mut finished = approved("ABC-123", 2, 4);
        let claim = claim_for(&finished, 2, 4);
        finished.apply(Transition::Finish, DateTime::now()).unwrap();
        assert!(!claim.conflicts_with(&finished));

        let mut cancelled = approved("ABC-123", 2, 4);
        let claim = claim_for(&cancelled, 2, 4);
        cancelled
            .apply(
                Transition::Cancel {
                    reason: Reason::new("broken truck").unwrap(),
                    by: Actor::System,
                },
                DateTime::now(),
            )
            .unwrap();
        assert!(!claim.conflicts_with(&cancelled));
    }

    #[test]
    fn stats() {
        let mut stats = Stats::default();
        assert_eq!(stats.completion_rate(), None);

        for status in [
            Status::Pending,
            Status::Finished,
            Status::Finished,
            Status::Cancelled,
        ] {
            stats.count(status);
        }

        assert_eq!(stats.total(), 4);
        assert_eq!(stats.finished, 2);
        assert_eq!(stats.completion_rate(), Some(50.0));
    }
}
