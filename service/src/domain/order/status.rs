//! [`Status`] of an [`Order`] and its transitions.

use common::define_kind;
use serde::{Deserialize, Serialize};

#[cfg(doc)]
use crate::domain::Order;

define_kind! {
    #[doc = "Status of an [`Order`]."]
    #[derive(Deserialize, Serialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    enum Status {
        #[doc = "[`Order`] awaits a truck to be submitted."]
        Pending = 1,

        #[doc = "Truck is submitted and the [`Order`] is being fulfilled."]
        Approved = 2,

        #[doc = "[`Order`] is delivered."]
        Finished = 3,

        #[doc = "[`Order`] is cancelled."]
        Cancelled = 4,
    }
}

impl Status {
    /// [`Status`] every [`Order`] starts with.
    pub const INITIAL: Self = Self::Pending;

    /// Returns the [`Status`]es reachable from this one in a single
    /// transition.
    #[must_use]
    pub const fn allowed_next(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Approved, Self::Cancelled],
            Self::Approved => &[Self::Finished, Self::Cancelled],
            Self::Finished | Self::Cancelled => &[],
        }
    }

    /// Indicates whether an [`Order`] may transition from this [`Status`] to
    /// the `next` one.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next().contains(&next)
    }

    /// Indicates whether no transition is possible from this [`Status`].
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        self.allowed_next().is_empty()
    }
}

#[cfg(test)]
mod spec {
    use serde::{Deserialize, Serialize};

    use super::Status;

    #[test]
    fn transition_table() {
        use Status as S;

        let allowed = [
            (S::Pending, S::Approved),
            (S::Pending, S::Cancelled),
            (S::Approved, S::Finished),
            (S::Approved, S::Cancelled),
        ];
        for &from in S::ALL {
            for &to in S::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}",
                );
            }
        }
    }

    #[test]
    fn terminal_statuses() {
        assert!(!Status::Pending.is_terminal());
        assert!(!Status::Approved.is_terminal());
        assert!(Status::Finished.is_terminal());
        assert!(Status::Cancelled.is_terminal());
    }

    #[test]
    fn representation() {
        assert_eq!(Status::INITIAL.u8(), 1);
        assert_eq!(Status::Cancelled.to_string(), "CANCELLED");
        assert_eq!("APPROVED".parse::<Status>().unwrap(), Status::Approved);
        assert_eq!(Status::try_from(3), Ok(Status::Finished));
        assert_eq!(Status::try_from(0), Err(0));
    }

    #[test]
    fn is_serializable() {
        fn serde_bounds<T: Serialize + for<'de> Deserialize<'de>>() {}

        serde_bounds::<Status>();
    }
}
