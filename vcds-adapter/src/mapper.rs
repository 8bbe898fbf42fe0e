//! Mapping `query-series` results into host series.

use vcds_types::{
    Datapoint, HostRecord, MappedSeries, QueryResponse, SeriesElement, SeriesResult, UNKNOWN_HOST,
};

/// Convert upstream series into `{target, datapoints}` series.
///
/// Each element's values are spread evenly over `[from, until]`: with `k`
/// values, point `i` lands at `from + i * (until - from) / k` seconds,
/// reported in milliseconds. An empty result list, or one whose first entry
/// has no elements, maps to no series at all.
pub fn map_query_response(
    series: &[SeriesResult],
    hosts: &[HostRecord],
    from: i64,
    until: i64,
) -> QueryResponse {
    match series.first() {
        Some(first) if !first.elements.is_empty() => {}
        _ => return QueryResponse::empty(),
    }

    let data = series
        .iter()
        .flat_map(|result| result.elements.iter())
        .map(|element| MappedSeries {
            target: series_label(element, hosts),
            datapoints: datapoints(&element.series, from, until),
        })
        .collect();

    QueryResponse { data }
}

fn series_label(element: &SeriesElement, hosts: &[HostRecord]) -> String {
    match element.host {
        Some(id) => hosts
            .iter()
            .find(|host| host.id == id)
            .map(|host| host.name.clone())
            .unwrap_or_else(|| UNKNOWN_HOST.to_string()),
        None => element.metric.clone(),
    }
}

fn datapoints(values: &[Option<f64>], from: i64, until: i64) -> Vec<Datapoint> {
    if values.is_empty() {
        return Vec::new();
    }

    let step = until.saturating_sub(from) as f64 / values.len() as f64;
    values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let secs = from as f64 + i as f64 * step;
            (*value, (secs * 1000.0).round() as i64)
        })
        .collect()
}
