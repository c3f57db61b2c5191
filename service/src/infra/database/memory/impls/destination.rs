//! [`Destination`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::{contract, destination, pricing::Candidate, Destination},
    infra::{
        database::{self, memory::Access, Memory},
        Database,
    },
    read::contract::Active,
};

impl<S: Access> Database<Select<By<Option<Destination>, destination::Id>>>
    for Memory<S>
{
    type Ok = Option<Destination>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Destination>, destination::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.with(|s| s.destinations.get(&id).cloned()).await
    }
}

impl<S: Access>
    Database<
        Select<By<Option<Destination>, (contract::Id, destination::City)>>,
    > for Memory<S>
{
    type Ok = Option<Destination>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Option<Destination>, (contract::Id, destination::City)>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let (contract_id, city) = by.into_inner();
        self.with(|s| {
            s.destinations
                .values()
                .find(|d| d.contract_id == contract_id && d.city == city)
                .cloned()
        })
        .await
    }
}

impl<S: Access> Database<Insert<Destination>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(destination): Insert<Destination>,
    ) -> Result<Self::Ok, Self::Err> {
        self.with(|s| {
            _ = s.destinations.insert(destination.id, destination);
        })
        .await
    }
}

impl<S: Access>
    Database<Select<By<Vec<Active<Candidate>>, destination::City>>>
    for Memory<S>
{
    type Ok = Vec<Active<Candidate>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Active<Candidate>>, destination::City>>,
    ) -> Result<Self::Ok, Self::Err> {
        let city = by.into_inner();
        self.with(|s| {
            s.destinations
                .values()
                .filter(|d| d.city == city)
                .filter_map(|d| {
                    let contract = s.contracts.get(&d.contract_id)?;
                    contract.is_active().then(|| {
                        Active(Candidate {
                            contract: contract.clone(),
                            destination: d.clone(),
                        })
                    })
                })
                .collect()
        })
        .await
    }
}
