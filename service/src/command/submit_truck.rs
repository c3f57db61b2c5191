//! [`Command`] for submitting a truck for an [`Order`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        carrier::{self, Plate},
        order::{self, Event, Status, Transition, TransitionError},
        Order,
    },
    infra::{database, Database},
    read::order::{PlateAvailable, PlateClaim, Truck},
    Service,
};

use super::Command;

/// [`Command`] for submitting a truck for an [`Order`], approving it.
#[derive(Clone, Debug)]
pub struct SubmitTruck {
    /// ID of the [`Order`] to submit the truck for.
    pub order_id: order::Id,

    /// ID of the carrier submitting the truck.
    pub carrier_id: carrier::Id,

    /// [`Plate`] of the submitted truck.
    pub plate: Plate,
}

impl<Db> Command<SubmitTruck> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Order>, order::Id>>,
            Ok = Option<Order>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<Order, order::Id>>,
            Err = Traced<database::Error>,
        > + Database<Lock<By<Order, Truck>>, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Order>, order::Id>>,
            Ok = Option<Order>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<PlateAvailable, PlateClaim>>,
            Ok = PlateAvailable,
            Err = Traced<database::Error>,
        > + Database<Insert<Order>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Order;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: SubmitTruck) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SubmitTruck {
            order_id,
            carrier_id,
            plate,
        } = cmd;

        let order = self
            .database()
            .execute(Select(By::<Option<Order>, _>::new(order_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::OrderNotExists(order_id))
            .map_err(tracerr::wrap!())?;
        if order.carrier_id != carrier_id {
            return Err(tracerr::new!(E::OrderNotAssigned {
                order_id,
                carrier_id,
            }));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent transitions of the same `Order`.
        tx.execute(Lock(By::<Order, _>::new(order_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let truck = Truck { carrier_id, plate };

        // Avoid claiming the same truck concurrently by different `Order`s.
        tx.execute(Lock(By::<Order, _>::new(truck.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut order = tx
            .execute(Select(By::<Option<Order>, _>::new(order_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::OrderNotExists(order_id))
            .map_err(tracerr::wrap!())?;

        let from = order.status();
        if !from.can_transition_to(Status::Approved) {
            return Err(tracerr::new!(E::InvalidTransition(TransitionError {
                from,
                to: Status::Approved,
            })));
        }

        let available = tx
            .execute(Select(By::new(PlateClaim {
                truck: truck.clone(),
                window: order.window,
                except: Some(order_id),
            })))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !*available {
            return Err(tracerr::new!(E::ConflictingPlate(truck)));
        }

        order
            .apply(
                Transition::Approve {
                    plate: truck.plate.clone(),
                },
                DateTime::now(),
            )
            .map_err(tracerr::from_and_wrap!(=> E))?;

        tx.execute(Insert(order.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!("`Order(id: {order_id})` approved with `{}`", truck.plate);
        self.publish(Event::Transitioned {
            id: order_id,
            carrier_id,
            from,
            to: order.status(),
        });

        Ok(order)
    }
}

/// Error of [`SubmitTruck`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Truck`] is claimed by another [`Order`] for an overlapping loading
    /// window.
    #[display("{_0} is already claimed for an overlapping loading window")]
    ConflictingPlate(#[error(not(source))] Truck),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Order`] cannot be approved in its current [`Status`].
    #[display("{_0}")]
    #[from]
    InvalidTransition(TransitionError),

    /// [`Order`] is assigned to another carrier.
    #[display(
        "`Order(id: {order_id})` is not assigned to \
         `Carrier(id: {carrier_id})`"
    )]
    OrderNotAssigned {
        /// ID of the [`Order`].
        order_id: order::Id,

        /// ID of the carrier submitting the truck.
        carrier_id: carrier::Id,
    },

    /// [`Order`] with the provided ID does not exist.
    #[display("`Order(id: {_0})` does not exist")]
    OrderNotExists(#[error(not(source))] order::Id),
}
