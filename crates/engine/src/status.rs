use core_types::Category;
use database::{DbError, IndicatorStore, SourceStats};
use serde::Serialize;

/// How many of the most recent years the status report lists.
const RECENT_YEARS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub category: Category,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearCount {
    pub year: i32,
    pub count: i64,
}

/// What the store currently holds, per source, category and year.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceStatus {
    pub total_records: i64,
    pub sources: Vec<SourceStats>,
    pub categories: Vec<CategoryCount>,
    /// The most recent years with data, newest first.
    pub years: Vec<YearCount>,
}

pub async fn data_source_status(store: &dyn IndicatorStore) -> Result<DataSourceStatus, DbError> {
    let sources = store.source_breakdown().await?;
    let categories = store
        .count_by_category()
        .await?
        .into_iter()
        .map(|(category, count)| CategoryCount { category, count })
        .collect();
    let years = store
        .count_by_year()
        .await?
        .into_iter()
        .take(RECENT_YEARS)
        .map(|(year, count)| YearCount { year, count })
        .collect();

    Ok(DataSourceStatus {
        total_records: sources.iter().map(|s| s.count).sum(),
        sources,
        categories,
        years,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use core_types::{Confidence, IndicatorRecord, SourceOrganization};
    use database::MemoryStore;

    fn record(source: SourceOrganization, category: Category, year: i32) -> IndicatorRecord {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 2, 0, 0).unwrap();
        IndicatorRecord {
            country_code: "USA".into(),
            indicator_code: format!("{}-{}", category.as_str(), source.as_str()),
            indicator_name: String::new(),
            year,
            value: Some(rust_decimal::Decimal::ONE),
            unit: String::new(),
            source,
            category,
            family: None,
            is_projected: false,
            confidence: Confidence::High,
            fetched_at: at,
            last_updated: at,
        }
    }

    #[tokio::test]
    async fn status_lists_only_the_ten_latest_years() {
        let store = MemoryStore::new();
        for year in 2000..2015 {
            let row = record(SourceOrganization::WorldBank, Category::Gdp, year);
            store.upsert(&row).await.unwrap();
        }
        store.upsert(&record(SourceOrganization::Imf, Category::Inflation, 2014)).await.unwrap();

        let status = data_source_status(&store).await.unwrap();
        assert_eq!(status.total_records, 16);
        assert_eq!(status.sources[0].source, SourceOrganization::WorldBank);
        assert_eq!(status.sources[0].count, 15);
        assert_eq!(status.years.len(), 10);
        assert_eq!(status.years[0], YearCount { year: 2014, count: 2 });
        assert_eq!(status.years[9].year, 2005);
        assert_eq!(status.categories.len(), 2);
    }
}
