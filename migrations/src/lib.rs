pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_facilities_table;
mod m20260301_000002_create_facility_capacities_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_facilities_table::Migration),
            Box::new(m20260301_000002_create_facility_capacities_table::Migration),
        ]
    }
}
