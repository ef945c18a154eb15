use super::history::TransactionRecord;
use super::snapshot::{cmp_dates, AmenityFlags, PropertySnapshot};
use crate::analysis::domain::ProductClass;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSource {
    Advert,
    StreetCentroid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub street: Option<String>,
    pub suburb: Option<String>,
    pub postcode: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub coordinate_source: Option<CoordinateSource>,
    /// False when no single snapshot carried every location field.
    pub complete: bool,
}

/// The single reconciled record for an address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalProperty {
    pub address_id: String,
    pub property_type: Option<String>,
    pub product_class: ProductClass,
    pub submarket: Option<String>,
    pub location: Location,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<f64>,
    pub parking: Option<u32>,
    pub area: Option<f64>,
    pub amenities: AmenityFlags,
    pub snapshot_count: usize,
}

/// Reconciles every snapshot of one address into a canonical record and its history.
///
/// The snapshots are first put in canonical order so the result never depends on
/// arrival order.
pub(crate) fn reconcile_address(
    address_id: &str,
    snapshots: &[PropertySnapshot],
) -> (CanonicalProperty, Vec<TransactionRecord>) {
    let mut ordered: Vec<&PropertySnapshot> = snapshots.iter().collect();
    ordered.sort_by(|a, b| a.canonical_cmp(b));

    let location = reconcile_location(&ordered);
    let property_type = first_present(&ordered, |snapshot| snapshot.property_type.as_ref());
    let product_class = property_type
        .as_deref()
        .map(ProductClass::classify)
        .unwrap_or(ProductClass::Other);

    let canonical = CanonicalProperty {
        address_id: address_id.to_string(),
        product_class,
        property_type,
        submarket: first_present(&ordered, |snapshot| snapshot.submarket.as_ref()),
        location,
        bedrooms: ordered.iter().filter_map(|snapshot| snapshot.bedrooms).max(),
        bathrooms: max_f64(ordered.iter().filter_map(|snapshot| snapshot.bathrooms)),
        parking: ordered.iter().filter_map(|snapshot| snapshot.parking).max(),
        area: max_f64(ordered.iter().filter_map(|snapshot| snapshot.area)),
        amenities: ordered
            .iter()
            .fold(AmenityFlags::default(), |acc, snapshot| acc.union(snapshot.amenities)),
        snapshot_count: ordered.len(),
    };

    (canonical, transaction_history(&ordered))
}

fn reconcile_location(ordered: &[&PropertySnapshot]) -> Location {
    if let Some(snapshot) = ordered.iter().find(|snapshot| snapshot.has_complete_location()) {
        let coordinates = snapshot.coordinates();
        return Location {
            street: snapshot.street.clone(),
            suburb: snapshot.suburb.clone(),
            postcode: snapshot.postcode.clone(),
            latitude: coordinates.map(|(lat, _, _)| lat),
            longitude: coordinates.map(|(_, lon, _)| lon),
            coordinate_source: coordinates.map(coordinate_source),
            complete: true,
        };
    }

    let coordinates = ordered.iter().find_map(|snapshot| snapshot.coordinates());
    Location {
        street: first_present(ordered, |snapshot| snapshot.street.as_ref()),
        suburb: first_present(ordered, |snapshot| snapshot.suburb.as_ref()),
        postcode: first_present(ordered, |snapshot| snapshot.postcode.as_ref()),
        latitude: coordinates.map(|(lat, _, _)| lat),
        longitude: coordinates.map(|(_, lon, _)| lon),
        coordinate_source: coordinates.map(coordinate_source),
        complete: false,
    }
}

fn coordinate_source((_, _, from_centroid): (f64, f64, bool)) -> CoordinateSource {
    if from_centroid {
        CoordinateSource::StreetCentroid
    } else {
        CoordinateSource::Advert
    }
}

fn first_present<'a, F>(ordered: &[&'a PropertySnapshot], field: F) -> Option<String>
where
    F: Fn(&'a PropertySnapshot) -> Option<&'a String>,
{
    ordered.iter().find_map(|snapshot| field(*snapshot)).cloned()
}

/// Missing values never take part; `None` only when every snapshot is missing.
fn max_f64(values: impl Iterator<Item = f64>) -> Option<f64> {
    values
        .filter(|value| !value.is_nan())
        .max_by(|a, b| a.total_cmp(b))
}

/// One record per transaction id, dated records ascending and undated ones last.
fn transaction_history(ordered: &[&PropertySnapshot]) -> Vec<TransactionRecord> {
    let mut seen = HashSet::new();
    let mut records: Vec<TransactionRecord> = ordered
        .iter()
        .filter(|snapshot| seen.insert(snapshot.transaction_id.clone()))
        .map(|snapshot| TransactionRecord {
            transaction_id: snapshot.transaction_id.clone(),
            date: snapshot.first_advertised.or(snapshot.last_advertised),
            price: snapshot.price.or(snapshot.last_price),
            first_price: snapshot.first_price,
            last_price: snapshot.last_price,
            days_on_market: match (snapshot.first_advertised, snapshot.last_advertised) {
                (Some(first), Some(last)) if last >= first => Some((last - first).num_days()),
                _ => None,
            },
        })
        .collect();

    records.sort_by(|a, b| {
        cmp_dates(a.date, b.date).then_with(|| a.transaction_id.cmp(&b.transaction_id))
    });
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2016, 4, day)
    }

    fn snapshot(transaction: &str) -> PropertySnapshot {
        PropertySnapshot {
            address_id: "A1".to_string(),
            transaction_id: transaction.to_string(),
            ..PropertySnapshot::default()
        }
    }

    #[test]
    fn structural_fields_take_the_maximum_present_value() {
        let mut a = snapshot("t1");
        a.bedrooms = None;
        let mut b = snapshot("t2");
        b.bedrooms = Some(3);
        b.area = Some(80.5);
        let mut c = snapshot("t3");
        c.bedrooms = Some(2);
        c.area = Some(92.0);

        let (canonical, _) = reconcile_address("A1", &[a, b, c]);
        assert_eq!(canonical.bedrooms, Some(3));
        assert_eq!(canonical.area, Some(92.0));
        assert_eq!(canonical.parking, None);
        assert_eq!(canonical.bathrooms, None);
    }

    #[test]
    fn amenity_flags_are_ored() {
        let a = snapshot("t1");
        let mut b = snapshot("t2");
        b.amenities.has_balcony = true;

        let (canonical, _) = reconcile_address("A1", &[a, b]);
        assert!(canonical.amenities.has_balcony);
        assert!(!canonical.amenities.has_pool);
    }

    #[test]
    fn location_comes_from_first_complete_snapshot_with_centroid_fallback() {
        let mut partial = snapshot("t1");
        partial.first_advertised = date(1);
        partial.street = Some("1 george st".to_string());
        partial.suburb = Some("sydney".to_string());

        let mut complete = snapshot("t2");
        complete.first_advertised = date(9);
        complete.street = Some("1 george street".to_string());
        complete.suburb = Some("sydney".to_string());
        complete.postcode = Some("2000".to_string());
        complete.street_latitude = Some(-33.86);
        complete.street_longitude = Some(151.2);

        let (canonical, _) = reconcile_address("A1", &[partial, complete]);
        assert!(canonical.location.complete);
        assert_eq!(canonical.location.street.as_deref(), Some("1 george street"));
        assert_eq!(
            canonical.location.coordinate_source,
            Some(CoordinateSource::StreetCentroid)
        );
        assert_eq!(canonical.location.latitude, Some(-33.86));
    }

    #[test]
    fn incomplete_locations_are_assembled_field_by_field() {
        let mut early = snapshot("t1");
        early.first_advertised = date(1);
        early.suburb = Some("glebe".to_string());

        let mut middle = snapshot("t2");
        middle.first_advertised = date(5);
        middle.street = Some("4 bay st".to_string());
        middle.suburb = Some("ultimo".to_string());
        middle.street_latitude = Some(-33.88);
        middle.street_longitude = Some(151.19);

        let mut late = snapshot("t3");
        late.first_advertised = date(9);
        late.postcode = Some("2037".to_string());
        late.latitude = Some(-33.879);
        late.longitude = Some(151.186);

        let (canonical, _) = reconcile_address("A1", &[late, early, middle]);
        let location = &canonical.location;
        assert!(!location.complete);
        assert_eq!(location.suburb.as_deref(), Some("glebe"));
        assert_eq!(location.street.as_deref(), Some("4 bay st"));
        assert_eq!(location.postcode.as_deref(), Some("2037"));
        assert_eq!(location.latitude, Some(-33.88));
        assert_eq!(location.longitude, Some(151.19));
        assert_eq!(
            location.coordinate_source,
            Some(CoordinateSource::StreetCentroid)
        );
    }

    #[test]
    fn history_is_preserved_and_ordered() {
        let mut late = snapshot("t2");
        late.first_advertised = date(20);
        late.last_advertised = date(27);
        late.price = Some(650.0);
        let mut early = snapshot("t1");
        early.first_advertised = date(2);
        early.price = Some(600.0);
        let undated = snapshot("t0");
        let mut duplicate = early.clone();
        duplicate.price = Some(610.0);

        let (_, history) = reconcile_address("A1", &[late, undated, early, duplicate]);
        let ids: Vec<&str> = history.iter().map(|r| r.transaction_id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2", "t0"]);
        assert_eq!(history[0].price, Some(600.0));
        assert_eq!(history[1].days_on_market, Some(7));
    }

    #[test]
    fn result_is_independent_of_snapshot_order() {
        let mut snapshots = Vec::new();
        for (index, beds) in [Some(2), None, Some(4), Some(3)].into_iter().enumerate() {
            let mut s = snapshot(&format!("t{index}"));
            s.first_advertised = date(index as u32 + 1);
            s.bedrooms = beds;
            s.property_type = Some(if index == 2 { "house" } else { "townhouse" }.to_string());
            s.suburb = Some(format!("suburb-{index}"));
            s.amenities.has_pool = index == 1;
            snapshots.push(s);
        }

        let forward = reconcile_address("A1", &snapshots);
        snapshots.reverse();
        let backward = reconcile_address("A1", &snapshots);
        snapshots.swap(0, 2);
        let shuffled = reconcile_address("A1", &snapshots);

        assert_eq!(forward, backward);
        assert_eq!(forward, shuffled);
        assert_eq!(forward.0.bedrooms, Some(4));
        assert_eq!(forward.0.property_type.as_deref(), Some("townhouse"));
        assert_eq!(forward.0.product_class, ProductClass::House);
    }
}
