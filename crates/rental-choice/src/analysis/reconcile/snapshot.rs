use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Amenity flags reported by a long-term advert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmenityFlags {
    pub has_balcony: bool,
    pub has_air_conditioning: bool,
    pub has_pool: bool,
    pub has_garden: bool,
    pub has_dishwasher: bool,
    pub is_furnished: bool,
    pub pets_allowed: bool,
}

impl AmenityFlags {
    /// Logical OR of every flag.
    pub fn union(self, other: Self) -> Self {
        Self {
            has_balcony: self.has_balcony || other.has_balcony,
            has_air_conditioning: self.has_air_conditioning || other.has_air_conditioning,
            has_pool: self.has_pool || other.has_pool,
            has_garden: self.has_garden || other.has_garden,
            has_dishwasher: self.has_dishwasher || other.has_dishwasher,
            is_furnished: self.is_furnished || other.is_furnished,
            pets_allowed: self.pets_allowed || other.pets_allowed,
        }
    }
}

/// One scraped observation of a long-term advert for an address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertySnapshot {
    pub address_id: String,
    pub transaction_id: String,
    pub property_type: Option<String>,
    pub street: Option<String>,
    pub suburb: Option<String>,
    pub postcode: Option<String>,
    pub submarket: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Street centroid used when the advert carries no coordinates.
    pub street_latitude: Option<f64>,
    pub street_longitude: Option<f64>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<f64>,
    pub parking: Option<u32>,
    pub area: Option<f64>,
    pub amenities: AmenityFlags,
    pub price: Option<f64>,
    pub first_advertised: Option<NaiveDate>,
    pub last_advertised: Option<NaiveDate>,
    pub first_price: Option<f64>,
    pub last_price: Option<f64>,
}

impl PropertySnapshot {
    pub(crate) fn coordinates(&self) -> Option<(f64, f64, bool)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon, false)),
            _ => match (self.street_latitude, self.street_longitude) {
                (Some(lat), Some(lon)) => Some((lat, lon, true)),
                _ => None,
            },
        }
    }

    pub(crate) fn has_complete_location(&self) -> bool {
        self.street.is_some()
            && self.suburb.is_some()
            && self.postcode.is_some()
            && self.coordinates().is_some()
    }

    /// Total order used to make every "first snapshot" rule independent of arrival order.
    pub(crate) fn canonical_cmp(&self, other: &Self) -> Ordering {
        cmp_dates(self.first_advertised, other.first_advertised)
            .then_with(|| cmp_dates(self.last_advertised, other.last_advertised))
            .then_with(|| self.transaction_id.cmp(&other.transaction_id))
            .then_with(|| cmp_f64(self.price, other.price))
            .then_with(|| self.street.cmp(&other.street))
            .then_with(|| self.suburb.cmp(&other.suburb))
            .then_with(|| self.postcode.cmp(&other.postcode))
            .then_with(|| self.property_type.cmp(&other.property_type))
            .then_with(|| self.submarket.cmp(&other.submarket))
            .then_with(|| cmp_f64(self.latitude, other.latitude))
            .then_with(|| cmp_f64(self.longitude, other.longitude))
            .then_with(|| cmp_f64(self.street_latitude, other.street_latitude))
            .then_with(|| cmp_f64(self.street_longitude, other.street_longitude))
    }
}

/// Undated snapshots sort after dated ones.
pub(crate) fn cmp_dates(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn cmp_f64(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
