//! Filter query engine.
//!
//! | Module | Role |
//! |--------|------|
//! | [`indexed`] | Per-domain attribute extraction |
//! | [`index`] | Lazily indexed collections and result sets |
//! | [`predicate`] | Subject restriction plus constrained facets |
//! | [`query`] | Query and result contracts |
//! | [`service`] | Population then event filtering |
//! | [`stats`] | Available-filter folding |
//! | [`cache`] | Populations cached per dataset set |
//! | [`provider`] | Fetch, enrich and wrap per domain |
//! | [`domain`] | Domain catalogue and wiring |

pub mod cache;
pub mod domain;
pub mod error;
pub mod index;
pub mod indexed;
pub mod predicate;
pub mod provider;
pub mod query;
pub mod service;
pub mod stats;

pub use cache::{Population, SubjectCache};
pub use domain::{
    AeEvent, AeFilterService, Domain, DoseEvent, DoseFilterService, LabEvent, LabFilterService,
    RenalEvent, RenalFilterService, StudyProviders, StudySource, TumourEvent,
    TumourFilterService, VitalEvent, VitalFilterService,
};
pub use error::{FilterError, Result, SourceError};
pub use index::{IndexedCollection, ResultSet};
pub use indexed::{AttrOf, FiltersOf, Indexed};
pub use predicate::Predicate;
pub use provider::{
    DomainProvider, EnrichContext, PopulationProvider, PopulationSourceSet, RawDataSource,
    StudyInfoSource, fetch_all,
};
pub use query::{EventQuery, FilterQuery, FilterResult, PopulationQuery, QueryKind, SubjectCollection};
pub use service::{EventFilterService, FilterService, PopulationFilterService};
pub use stats::{FilterStatsCollector, collect_filters};
