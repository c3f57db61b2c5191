//! In-memory [`Database`] implementation.
//!
//! Keeps everything in a single process, so is suitable for tests and local
//! runs only. Transactions are serialized: a [`Tx`] exclusively owns the
//! [`Storage`] from its start till its [`Commit`] or drop.

mod impls;

use std::{
    collections::{BTreeMap, HashMap},
    future::Future,
    sync::Arc,
};

use common::operations::{By, Commit, Lock, Transact};
use derive_more::{Display, Error as StdError};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracerr::Traced;

use crate::{
    domain::{
        contract, destination, fuel_price, order, Contract, Destination, Order,
    },
    infra::{database, Database},
};

/// In-memory [`Database`] client.
#[derive(Clone, Debug, Default)]
pub struct Memory<S = NonTx>(S);

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Everything stored by a [`Memory`] database.
#[derive(Clone, Debug, Default)]
pub struct Storage {
    /// Stored [`Contract`]s.
    contracts: HashMap<contract::Id, Contract>,

    /// Stored [`Destination`]s.
    destinations: HashMap<destination::Id, Destination>,

    /// Stored fuel price [`fuel_price::Record`]s, by their dates.
    fuel_prices: BTreeMap<fuel_price::EffectiveDate, fuel_price::Record>,

    /// Stored [`Order`]s.
    orders: HashMap<order::Id, Order>,
}

/// Non-transactional [`Memory`] client.
#[derive(Clone, Debug, Default)]
pub struct NonTx {
    /// Shared [`Storage`].
    storage: Arc<Mutex<Storage>>,
}

/// Transactional [`Memory`] client.
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`Staged`] changes, or [`None`] once committed.
    staged: Arc<Mutex<Option<Staged>>>,
}

/// Changes of a [`Tx`] not committed yet.
#[derive(Debug)]
struct Staged {
    /// Exclusive access to the shared [`Storage`].
    guard: OwnedMutexGuard<Storage>,

    /// Working copy of the [`Storage`].
    storage: Storage,
}

/// Access to a [`Storage`].
pub trait Access {
    /// Runs the provided function over the [`Storage`].
    ///
    /// # Errors
    ///
    /// If the [`Storage`] is not accessible anymore.
    fn with<R>(
        &self,
        f: impl FnOnce(&mut Storage) -> R,
    ) -> impl Future<Output = Result<R, Traced<database::Error>>>;
}

impl Access for NonTx {
    async fn with<R>(
        &self,
        f: impl FnOnce(&mut Storage) -> R,
    ) -> Result<R, Traced<database::Error>> {
        Ok(f(&mut *self.storage.lock().await))
    }
}

impl Access for Tx {
    async fn with<R>(
        &self,
        f: impl FnOnce(&mut Storage) -> R,
    ) -> Result<R, Traced<database::Error>> {
        let mut staged = self.staged.lock().await;
        let staged = staged
            .as_mut()
            .ok_or_else(|| tracerr::new!(Error::TxFinished))
            .map_err(tracerr::map_from)?;
        Ok(f(&mut staged.storage))
    }
}

impl<S: Access> Memory<S> {
    /// Runs the provided function over the [`Storage`] of this [`Memory`]
    /// database.
    async fn with<R>(
        &self,
        f: impl FnOnce(&mut Storage) -> R,
    ) -> Result<R, Traced<database::Error>> {
        self.0.with(f).await.map_err(tracerr::wrap!())
    }
}

impl Database<Transact> for Memory<NonTx> {
    type Ok = Memory<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        let guard = Arc::clone(&self.0.storage).lock_owned().await;
        let storage = guard.clone();
        Ok(Memory(Tx {
            staged: Arc::new(Mutex::new(Some(Staged { guard, storage }))),
        }))
    }
}

impl Database<Transact> for Memory<Tx> {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        let Staged { mut guard, storage } = self
            .0
            .staged
            .lock()
            .await
            .take()
            .ok_or_else(|| tracerr::new!(Error::TxFinished))
            .map_err(tracerr::map_from)?;
        *guard = storage;
        Ok(())
    }
}

impl<S, T, B> Database<Lock<By<T, B>>> for Memory<S>
where
    S: Access,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Lock<By<T, B>>) -> Result<Self::Ok, Self::Err> {
        // `Tx` owns the whole `Storage` already, so there is nothing to lock.
        Ok(())
    }
}

/// [`Memory`] database error.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// [`Tx`] was used after being committed.
    #[display("`Tx` is already committed")]
    TxFinished,
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Commit, Insert, Select, Transact};

    use crate::{
        domain::{order, Order},
        fixtures,
        infra::Database as _,
    };

    use super::Memory;

    #[tokio::test]
    async fn commit_publishes_changes() {
        let db = Memory::new();
        let order = fixtures::order();

        let tx = db.execute(Transact).await.unwrap();
        tx.execute(Insert(order.clone())).await.unwrap();
        tx.execute(Commit).await.unwrap();

        let found = db
            .execute(Select(By::<Option<Order>, _>::new(order.id)))
            .await
            .unwrap();
        assert_eq!(found, Some(order));
    }

    #[tokio::test]
    async fn drop_discards_changes() {
        let db = Memory::new();
        let order = fixtures::order();

        let tx = db.execute(Transact).await.unwrap();
        tx.execute(Insert(order.clone())).await.unwrap();
        drop(tx);

        let found = db
            .execute(Select(By::<Option<Order>, order::Id>::new(order.id)))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn committed_tx_is_unusable() {
        let db = Memory::new();

        let tx = db.execute(Transact).await.unwrap();
        tx.execute(Commit).await.unwrap();

        assert!(tx.execute(Commit).await.is_err());
        assert!(tx.execute(Insert(fixtures::order())).await.is_err());
        // Shared storage is released after commit.
        drop(db.execute(Transact).await.unwrap());
    }
}
