use super::dates::parse_date;
use super::normalizer::{clean_text, flag, level, level_opt, non_empty, number};
use super::DropReason;
use crate::analysis::calendar::{BookingStatus, DailyObservation};
use crate::analysis::domain::StrListing;
use crate::analysis::reconcile::{AmenityFlags, PropertySnapshot};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::io::Read;

pub(crate) fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// Date-repair bookkeeping for one row.
#[derive(Debug, Default)]
pub(crate) struct DateTally {
    pub repaired: usize,
    pub discarded: usize,
}

impl DateTally {
    fn required(&mut self, raw: Option<&str>) -> Result<NaiveDate, DropReason> {
        let parsed = raw.and_then(parse_date).ok_or(DropReason::UnparseableDate)?;
        if parsed.repaired {
            self.repaired += 1;
        }
        Ok(parsed.date)
    }

    fn optional(&mut self, raw: Option<&str>) -> Option<NaiveDate> {
        let raw = raw?;
        match parse_date(raw) {
            Some(parsed) => {
                if parsed.repaired {
                    self.repaired += 1;
                }
                Some(parsed.date)
            }
            None => {
                self.discarded += 1;
                None
            }
        }
    }
}

/// A raw CSV row that converts into a domain record or names why it was dropped.
pub(crate) trait IntoRecord {
    type Record;

    fn into_record(self, dates: &mut DateTally) -> Result<Self::Record, DropReason>;
}

fn identifier(raw: Option<String>) -> Result<String, DropReason> {
    non_empty(raw).ok_or(DropReason::MissingIdentifier)
}

#[derive(Debug, Deserialize)]
pub(crate) struct LedgerRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    property_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    date: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    status: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    price: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    booking_date: Option<String>,
}

impl IntoRecord for LedgerRow {
    type Record = DailyObservation;

    fn into_record(self, dates: &mut DateTally) -> Result<DailyObservation, DropReason> {
        let property_id = identifier(self.property_id)?;
        let date = dates.required(self.date.as_deref())?;
        let status = self
            .status
            .as_deref()
            .and_then(BookingStatus::parse)
            .ok_or(DropReason::UnknownStatus)?;

        Ok(DailyObservation {
            property_id,
            date,
            status,
            price: number(self.price.as_deref()),
            booking_date: dates.optional(self.booking_date.as_deref()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListingRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    property_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    host_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    property_type: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    bedrooms: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    bathrooms: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    max_guests: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    min_stay: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    cancellation_policy: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    suburb: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    submarket: Option<String>,
}

impl IntoRecord for ListingRow {
    type Record = StrListing;

    fn into_record(self, _dates: &mut DateTally) -> Result<StrListing, DropReason> {
        Ok(StrListing {
            property_id: identifier(self.property_id)?,
            host_id: identifier(self.host_id)?,
            property_type: level_opt(self.property_type.as_deref())
                .unwrap_or_else(|| "unknown".to_string()),
            bedrooms: number(self.bedrooms.as_deref()),
            bathrooms: number(self.bathrooms.as_deref()),
            max_guests: number(self.max_guests.as_deref()),
            min_stay: number(self.min_stay.as_deref()),
            cancellation_policy: level_opt(self.cancellation_policy.as_deref()),
            suburb: level_opt(self.suburb.as_deref()),
            submarket: level_opt(self.submarket.as_deref()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SnapshotRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    address_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    transaction_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    property_type: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    street: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    suburb: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    postcode: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    submarket: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    latitude: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    longitude: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    street_latitude: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    street_longitude: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    bedrooms: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    bathrooms: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    parking: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    area: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    has_balcony: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    has_air_conditioning: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    has_pool: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    has_garden: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    has_dishwasher: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    is_furnished: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pets_allowed: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    price: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    first_advertised: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    last_advertised: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    first_price: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    last_price: Option<String>,
}

impl IntoRecord for SnapshotRow {
    type Record = PropertySnapshot;

    fn into_record(self, dates: &mut DateTally) -> Result<PropertySnapshot, DropReason> {
        let amenities = AmenityFlags {
            has_balcony: flag(self.has_balcony.as_deref()),
            has_air_conditioning: flag(self.has_air_conditioning.as_deref()),
            has_pool: flag(self.has_pool.as_deref()),
            has_garden: flag(self.has_garden.as_deref()),
            has_dishwasher: flag(self.has_dishwasher.as_deref()),
            is_furnished: flag(self.is_furnished.as_deref()),
            pets_allowed: flag(self.pets_allowed.as_deref()),
        };

        Ok(PropertySnapshot {
            address_id: identifier(self.address_id)?,
            transaction_id: identifier(self.transaction_id)?,
            property_type: level_opt(self.property_type.as_deref()),
            street: self.street.as_deref().map(clean_text),
            suburb: level_opt(self.suburb.as_deref()),
            postcode: non_empty(self.postcode),
            submarket: level_opt(self.submarket.as_deref()),
            latitude: number(self.latitude.as_deref()),
            longitude: number(self.longitude.as_deref()),
            street_latitude: number(self.street_latitude.as_deref()),
            street_longitude: number(self.street_longitude.as_deref()),
            bedrooms: number(self.bedrooms.as_deref()),
            bathrooms: number(self.bathrooms.as_deref()),
            parking: number(self.parking.as_deref()),
            area: number(self.area.as_deref()),
            amenities,
            price: number(self.price.as_deref()),
            first_advertised: dates.optional(self.first_advertised.as_deref()),
            last_advertised: dates.optional(self.last_advertised.as_deref()),
            first_price: number(self.first_price.as_deref()),
            last_price: number(self.last_price.as_deref()),
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn rows<T: serde::de::DeserializeOwned>(csv: &str) -> Vec<T> {
        csv_reader(Cursor::new(csv.to_string()))
            .deserialize::<T>()
            .collect::<Result<_, _>>()
            .expect("valid csv")
    }

    #[test]
    fn ledger_row_requires_identifier_date_and_status() {
        let parsed: Vec<LedgerRow> = rows(
            "property_id,date,status,price,booking_date\n\
             ,2016-01-01,R,100,\n\
             L1,not a date,R,100,\n\
             L1,2016-01-01,X,100,\n\
             L1,01/02/2016,R,$120,2015-12-20\n",
        );
        let mut dates = DateTally::default();
        let results: Vec<_> = parsed
            .into_iter()
            .map(|row| row.into_record(&mut dates))
            .collect();

        assert_eq!(results[0], Err(DropReason::MissingIdentifier));
        assert_eq!(results[1], Err(DropReason::UnparseableDate));
        assert_eq!(results[2], Err(DropReason::UnknownStatus));
        let kept = results[3].as_ref().expect("repaired row kept");
        assert_eq!(kept.date, NaiveDate::from_ymd_opt(2016, 2, 1).expect("date"));
        assert_eq!(kept.price, Some(120.0));
        assert_eq!(dates.repaired, 1);
    }

    #[test]
    fn listing_levels_are_normalized() {
        let parsed: Vec<ListingRow> = rows(
            "property_id,host_id,property_type,bedrooms,bathrooms,max_guests,min_stay,cancellation_policy,suburb,submarket\n\
             L1,H1,Entire  Apartment,2,1.5,4,3,Strict,Bondi Beach,EAST\n",
        );
        let listing = parsed
            .into_iter()
            .next()
            .expect("row")
            .into_record(&mut DateTally::default())
            .expect("kept");
        assert_eq!(listing.property_type, "entire apartment");
        assert_eq!(listing.suburb.as_deref(), Some("bondi beach"));
        assert_eq!(listing.submarket.as_deref(), Some("east"));
        assert_eq!(listing.bathrooms, Some(1.5));
    }

    #[test]
    fn snapshot_clears_unparseable_optional_dates() {
        let parsed: Vec<SnapshotRow> = rows(
            "address_id,transaction_id,bedrooms,has_balcony,price,first_advertised,last_advertised\n\
             A1,T1,3,yes,550,sometime,2016/05/01\n",
        );
        let mut dates = DateTally::default();
        let snapshot = parsed
            .into_iter()
            .next()
            .expect("row")
            .into_record(&mut dates)
            .expect("kept");
        assert_eq!(snapshot.first_advertised, None);
        assert_eq!(
            snapshot.last_advertised,
            NaiveDate::from_ymd_opt(2016, 5, 1)
        );
        assert!(snapshot.amenities.has_balcony);
        assert_eq!(snapshot.bedrooms, Some(3));
        assert_eq!(dates.discarded, 1);
        assert_eq!(dates.repaired, 1);
    }
}
