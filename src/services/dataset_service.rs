use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, info, instrument};

use crate::catalog::{Catalog, SubjectSpec};
use crate::fetch_error::FetchError;
use crate::geojson::{Crs, FeatureCollection, CRS84};
use crate::geometry::{attach_geometry, GeometryLoader};
use crate::merge::{AlignmentError, AlignmentPolicy, PropertyMap};
use crate::sheet_fetcher::SheetFetcher;
use crate::store::{GeoJsonStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("Alignment check failed: {0}")]
    Alignment(#[from] AlignmentError),
    #[error("Storage failed: {0}")]
    Store(#[from] StoreError),
}

/// Rebuilds the zone dataset from the catalog's sheets and boundary source.
#[derive(Clone)]
pub struct DatasetService {
    sheet_fetcher: SheetFetcher,
    geometry_loader: GeometryLoader,
    catalog: Arc<Catalog>,
    store: GeoJsonStore,
    policy: AlignmentPolicy,
}

impl DatasetService {
    pub fn new(
        sheet_fetcher: SheetFetcher,
        geometry_loader: GeometryLoader,
        catalog: Arc<Catalog>,
        store: GeoJsonStore,
        policy: AlignmentPolicy,
    ) -> Self {
        Self {
            sheet_fetcher,
            geometry_loader,
            catalog,
            store,
            policy,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Fetch every sub-sheet of every subject and fold them into one map.
    ///
    /// Sub-sheets of a subject are fetched concurrently and merged in catalog order.
    #[instrument(skip(self), fields(subjects = self.catalog.subjects.len(), policy = %self.policy))]
    pub async fn build_properties(&self) -> Result<PropertyMap, DatasetError> {
        let mut properties = PropertyMap::new(self.catalog.id_columns.iter().cloned())
            .with_subjects(self.catalog.subject_names());

        for subject in &self.catalog.subjects {
            properties = self.merge_subject(properties, subject).await?;
        }

        Ok(properties.enforce_row_alignment(self.policy)?)
    }

    #[instrument(skip(self, properties, subject), fields(subject = %subject.name, sheets = subject.sub_sheets.len()))]
    async fn merge_subject(
        &self,
        mut properties: PropertyMap,
        subject: &SubjectSpec,
    ) -> Result<PropertyMap, DatasetError> {
        let catalog = &self.catalog;
        let tables = try_join_all(subject.sub_sheets.iter().map(|sub_sheet| {
            self.sheet_fetcher.fetch_table(
                &subject.key,
                &sub_sheet.sheet,
                &catalog.range,
                None,
                &catalog.converters,
            )
        }))
        .await?;

        for (sub_sheet, table) in subject.sub_sheets.iter().zip(tables) {
            debug!(
                "Merging {} rows for {} / {}",
                table.row_count(),
                subject.name,
                sub_sheet.sub_subject
            );
            properties = properties.merge_table(
                &table,
                &subject.name,
                &sub_sheet.sub_subject,
                &catalog.retained_columns,
            );
        }

        Ok(properties)
    }

    /// Build the full feature collection, geometry included
    #[instrument(skip(self))]
    pub async fn build_collection(&self) -> Result<FeatureCollection, DatasetError> {
        let properties = self.build_properties().await?;
        let boundaries = self.geometry_loader.load().await?;

        let properties = attach_geometry(
            properties,
            &boundaries,
            &self.catalog.id_property,
            &self.catalog.id_geo,
            self.policy,
        )?;

        let collection = properties.into_feature_collection(Some(Crs::named(CRS84)));
        info!("Built dataset with {} features", collection.len());
        Ok(collection)
    }

    /// Build and overwrite the stored dataset
    #[instrument(skip(self), fields(path = %self.store.path().display()))]
    pub async fn rebuild(&self) -> Result<FeatureCollection, DatasetError> {
        let collection = self.build_collection().await?;
        self.store.write(&collection).await?;
        info!("Stored dataset with {} features", collection.len());
        Ok(collection)
    }

    /// Whatever the last rebuild stored
    #[instrument(skip(self), fields(path = %self.store.path().display()))]
    pub async fn load_stored(&self) -> Result<FeatureCollection, DatasetError> {
        Ok(self.store.read().await?)
    }
}
