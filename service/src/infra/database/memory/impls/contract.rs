//! [`Contract`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Select},
    DateTime,
};
use tracerr::Traced;

use crate::{
    domain::{carrier, contract, Contract},
    infra::{
        database::{self, memory::Access, Memory},
        Database,
    },
    read::contract::Active,
};

impl<S: Access> Database<Select<By<Option<Contract>, contract::Id>>>
    for Memory<S>
{
    type Ok = Option<Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Contract>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.with(|s| s.contracts.get(&id).cloned()).await
    }
}

impl<S: Access> Database<Select<By<Option<Contract>, contract::Number>>>
    for Memory<S>
{
    type Ok = Option<Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Contract>, contract::Number>>,
    ) -> Result<Self::Ok, Self::Err> {
        let number = by.into_inner();
        self.with(|s| {
            s.contracts.values().find(|c| c.number == number).cloned()
        })
        .await
    }
}

impl<S: Access>
    Database<Select<By<Vec<contract::Number>, contract::RenewalPrefix>>>
    for Memory<S>
{
    type Ok = Vec<contract::Number>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<contract::Number>, contract::RenewalPrefix>>,
    ) -> Result<Self::Ok, Self::Err> {
        let prefix = by.into_inner();
        self.with(|s| {
            s.contracts
                .values()
                .filter(|c| {
                    AsRef::<str>::as_ref(&c.number).starts_with(prefix.as_ref())
                })
                .map(|c| c.number.clone())
                .collect()
        })
        .await
    }
}

impl<S: Access> Database<Select<By<Vec<Active<Contract>>, carrier::Id>>>
    for Memory<S>
{
    type Ok = Vec<Active<Contract>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Active<Contract>>, carrier::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let carrier_id = by.into_inner();
        let now = DateTime::now();
        self.with(|s| {
            let mut contracts = s
                .contracts
                .values()
                .filter(|c| c.carrier_id == carrier_id && c.is_active_at(now))
                .cloned()
                .collect::<Vec<_>>();
            contracts.sort_by(|a, b| {
                b.expires_at
                    .cmp(&a.expires_at)
                    .then_with(|| a.number.cmp(&b.number))
            });
            contracts.into_iter().map(Active).collect()
        })
        .await
    }
}

impl<S: Access>
    Database<Select<By<Vec<Active<Contract>>, contract::ExpirationDateTime>>>
    for Memory<S>
{
    type Ok = Vec<Active<Contract>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Vec<Active<Contract>>, contract::ExpirationDateTime>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let until = by.into_inner();
        let now = DateTime::now();
        self.with(|s| {
            let mut contracts = s
                .contracts
                .values()
                .filter(|c| c.is_active_at(now) && c.expires_at <= until)
                .cloned()
                .collect::<Vec<_>>();
            contracts.sort_by(|a, b| {
                a.expires_at
                    .cmp(&b.expires_at)
                    .then_with(|| a.number.cmp(&b.number))
            });
            contracts.into_iter().map(Active).collect()
        })
        .await
    }
}

impl<S: Access> Database<Insert<Contract>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(contract): Insert<Contract>,
    ) -> Result<Self::Ok, Self::Err> {
        self.with(|s| {
            _ = s.contracts.insert(contract.id, contract);
        })
        .await
    }
}
