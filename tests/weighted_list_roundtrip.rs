//! Property tests: weighted lists survive a trip through the CSV sink

use genrescrape::scrape_engine::{CsvSink, RecordSink};
use genrescrape::{Record, WeightedList};
use proptest::prelude::*;

fn weighted_list() -> impl Strategy<Value = WeightedList> {
    prop::collection::vec(("[0-9]{0,3}", "[a-zA-Z0-9 ,\"'-]{1,12}"), 0..8).prop_map(|pairs| {
        let mut list = WeightedList::new();
        for (weight, name) in pairs {
            list.push(weight, name);
        }
        list
    })
}

proptest! {
    #[test]
    fn lists_roundtrip_through_csv(
        artists in weighted_list(),
        similar in weighted_list(),
        opposite in weighted_list(),
    ) {
        let record = Record {
            name: "genre".to_string(),
            artists: artists.clone(),
            similar: similar.clone(),
            opposite: opposite.clone(),
            ..Record::default()
        };

        let mut sink = CsvSink::from_writer(Vec::new()).unwrap();
        sink.write_batch(std::slice::from_ref(&record)).unwrap();
        let bytes = sink.into_inner().unwrap();

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        prop_assert_eq!(rows.len(), 1);
        let row = &rows[0];

        prop_assert_eq!(WeightedList::from_joined(&row[7], &row[8]).unwrap(), artists);
        prop_assert_eq!(WeightedList::from_joined(&row[9], &row[10]).unwrap(), similar);
        prop_assert_eq!(WeightedList::from_joined(&row[11], &row[12]).unwrap(), opposite);
    }

    #[test]
    fn joined_cells_always_align(list in weighted_list()) {
        let weights = list.joined_weights();
        let names = list.joined_names();
        if list.is_empty() {
            prop_assert!(weights.is_empty() && names.is_empty());
        } else {
            prop_assert_eq!(weights.split('|').count(), list.len());
            prop_assert_eq!(names.split('|').count(), list.len());
        }
    }
}
