//! Id lookups and the band to tours aggregation.

use tourbook_types::{Band, BandId, Tour, TourDate, TourDateId, TourId};

/// Find a band by id.
pub fn find_band(bands: &[Band], id: BandId) -> Option<&Band> {
    bands.iter().find(|b| b.id == id)
}

/// Find a tour by id.
pub fn find_tour(tours: &[Tour], id: TourId) -> Option<&Tour> {
    tours.iter().find(|t| t.id == id)
}

/// All tours whose `band_id` matches, in collection order.
pub fn band_tours(tours: &[Tour], band_id: BandId) -> Vec<&Tour> {
    tours.iter().filter(|t| t.band_id == band_id).collect()
}

/// Find a tour date anywhere in the store, along with its owning tour.
pub fn find_tour_date(tours: &[Tour], id: TourDateId) -> Option<(&Tour, &TourDate)> {
    tours
        .iter()
        .find_map(|tour| tour.date(id).map(|date| (tour, date)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use tourbook_types::{NewTourDate, Timestamp};

    use super::*;

    fn band(name: &str) -> Band {
        Band {
            id: BandId::new(),
            name: name.to_owned(),
            genre: "Rock".to_owned(),
            image_url: None,
            created_at: Timestamp::now(),
        }
    }

    fn tour(band: &Band, cities: &[&str]) -> Tour {
        Tour {
            id: TourId::new(),
            band_id: band.id,
            band_name: band.name.clone(),
            dates: cities
                .iter()
                .map(|city| {
                    NewTourDate::new(Timestamp::now(), "Hall", *city, "Somewhere")
                        .into_tour_date(TourDateId::new())
                })
                .collect(),
            created_at: Timestamp::now(),
        }
    }

    #[test]
    fn finds_bands_and_tours_by_id() {
        let bands = vec![band("A"), band("B")];
        let tours = vec![tour(&bands[1], &["Oslo"])];
        assert_eq!(find_band(&bands, bands[1].id).unwrap().name, "B");
        assert!(find_band(&bands, BandId::new()).is_none());
        assert_eq!(find_tour(&tours, tours[0].id).unwrap().band_id, bands[1].id);
        assert!(find_tour(&tours, TourId::new()).is_none());
    }

    #[test]
    fn band_tours_keeps_collection_order() {
        let bands = vec![band("A"), band("B")];
        let tours = vec![
            tour(&bands[0], &["Oslo"]),
            tour(&bands[1], &["Rome"]),
            tour(&bands[0], &["Lima"]),
        ];
        let found: Vec<TourId> = band_tours(&tours, bands[0].id).iter().map(|t| t.id).collect();
        assert_eq!(found, vec![tours[0].id, tours[2].id]);
        assert!(band_tours(&tours, BandId::new()).is_empty());
    }

    #[test]
    fn finds_tour_date_across_tours() {
        let b = band("A");
        let tours = vec![tour(&b, &["Oslo"]), tour(&b, &["Rome", "Lima"])];
        let wanted = tours[1].dates[1].id;
        let (owner, date) = find_tour_date(&tours, wanted).unwrap();
        assert_eq!(owner.id, tours[1].id);
        assert_eq!(date.city, "Lima");
        assert!(find_tour_date(&tours, TourDateId::new()).is_none());
    }
}
