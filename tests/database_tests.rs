/// Database integration tests over the shipped restaurant domain.

use dialog_advice::core::database::SyntheticDatabase;
use dialog_advice::core::stats::MAX_ARITY;
use dialog_advice::core::vocab::SlotVocabulary;
use dialog_advice::schema::domain::DomainSpec;
use dialog_advice::schema::slot::ValueId;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;
use std::path::Path;

fn restaurant() -> DomainSpec {
    DomainSpec::load_from_ron(Path::new("domain_data/restaurant/domain.ron")).unwrap()
}

fn generate(seed: u64) -> (DomainSpec, SlotVocabulary, SyntheticDatabase) {
    let domain = restaurant();
    let mut vocab = SlotVocabulary::from_slots(domain.usr_slots.iter());
    let mut rng = StdRng::seed_from_u64(seed);
    let db = SyntheticDatabase::generate(&domain, &mut vocab, domain.db_size, &mut rng).unwrap();
    (domain, vocab, db)
}

#[test]
fn restaurant_domain_loads() {
    let domain = restaurant();
    assert_eq!(domain.name, "restaurant");
    assert_eq!(domain.usr_slot_names(), vec!["food", "area", "pricerange"]);
    assert_eq!(domain.usr_slot("food").unwrap().vocabulary.len(), 91);
    assert_eq!(domain.usr_slot("area").unwrap().vocabulary.len(), 5);
    assert_eq!(domain.sys_slots.len(), 2);
    assert_eq!(domain.db_size, 200);
}

#[test]
fn generated_table_has_system_columns() {
    let (domain, vocab, db) = generate(11);
    assert_eq!(db.num_rows(), 200);
    assert_eq!(db.sys_columns().len(), domain.sys_slots.len());
    for row in 0..db.num_rows() {
        let sys = db.system_row(row);
        assert_eq!(sys.uid, row);
        for (slot, id) in domain.sys_slots.iter().zip(&sys.values) {
            assert!(vocab.get_value(&slot.name, *id).is_ok());
        }
    }
}

#[test]
fn every_statistic_matches_select() {
    let (_, _, db) = generate(12);
    let stats = db.stats();
    assert!(!stats.is_empty());
    for row in stats.rows() {
        assert!(row.arity() >= 1 && row.arity() <= MAX_ARITY);
        let selection = db.select(&row.values).unwrap();
        assert_eq!(selection.len(), row.count, "count mismatch for {:?}", row.values);
    }
}

#[test]
fn every_table_row_is_counted_with_its_projections() {
    let (_, vocab, db) = generate(17);
    let stats = db.stats();
    let slots = ["food", "area", "pricerange"];

    for r in 0..db.num_rows() {
        let row = db.searchable_row(r);
        let full: Vec<Option<ValueId>> = row.iter().copied().map(Some).collect();
        let triple = stats.count_of(&full).expect("observed triple is counted");
        assert_eq!(triple, db.select(&full).unwrap().len());

        // All six proper projections: three pairs and three singles.
        for mask in 1..7u8 {
            let projection: Vec<Option<ValueId>> = (0..3)
                .map(|a| if mask & (1 << a) != 0 { full[a] } else { None })
                .collect();
            let count = stats
                .count_of(&projection)
                .unwrap_or_else(|| panic!("projection {:?} of row {} missing", projection, r));
            assert!(count >= triple, "{:?} counted {} < {}", projection, count, triple);
        }

        for (slot, id) in slots.iter().zip(&row) {
            assert!(vocab.get_value(slot, *id).is_ok());
        }
    }
}

#[test]
fn single_attribute_statistics_cover_the_table() {
    let (_, _, db) = generate(13);
    for attr in 0..3 {
        let total: usize = db
            .stats()
            .rows()
            .iter()
            .filter(|r| r.arity() == 1 && r.get(attr).is_some())
            .map(|r| r.count)
            .sum();
        assert_eq!(total, db.num_rows());
    }
}

#[test]
fn statistics_list_singles_before_pairs_before_triples() {
    let (_, _, db) = generate(14);
    let arities: Vec<usize> = db.stats().rows().iter().map(|r| r.arity()).collect();
    let mut sorted = arities.clone();
    sorted.sort();
    assert_eq!(arities, sorted);
}

#[test]
fn conjunctive_select_is_subset_of_each_term() {
    let (_, _, db) = generate(15);
    let row = db.searchable_row(0);
    let both = db.select(&[Some(row[0]), Some(row[1]), None]).unwrap();
    let food = db.select(&[Some(row[0]), None, None]).unwrap();
    let area = db.select(&[None, Some(row[1]), None]).unwrap();
    assert!(both.indices.contains(&0));
    assert!(both.indices.windows(2).all(|w| w[0] < w[1]));
    for idx in &both.indices {
        assert!(food.indices.contains(idx));
        assert!(area.indices.contains(idx));
    }
}

#[test]
fn out_of_range_value_matches_nothing() {
    let (_, _, db) = generate(16);
    let selection = db.select(&[None, Some(ValueId(500)), None]).unwrap();
    assert!(selection.is_empty());
}

#[test]
fn identical_seeds_give_identical_tables() {
    let (_, _, a) = generate(99);
    let (_, _, b) = generate(99);
    assert_eq!(a.unique_rows(), b.unique_rows());
    assert_eq!(a.stats().rows(), b.stats().rows());
}

#[test]
fn relation_file_drives_the_table() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[
            {{"food": "italian", "area": "centre", "pricerange": "cheap"}},
            {{"food": "italian", "area": "north", "pricerange": "cheap"}},
            {{"food": "raclette", "area": "centre", "pricerange": "expensive"}}
        ]"#
    )
    .unwrap();

    let domain = restaurant();
    let mut vocab = SlotVocabulary::from_slots(domain.usr_slots.iter());
    let records = SyntheticDatabase::load_relation(file.path()).unwrap();
    let mut rng = StdRng::seed_from_u64(1);
    let db = SyntheticDatabase::from_relation(&domain, &mut vocab, &records, &mut rng).unwrap();

    assert_eq!(db.num_rows(), 3);
    assert_eq!(vocab.len("food"), 92);
    let italian = vocab.lookup_id("food", "italian").unwrap();
    let cheap = vocab.lookup_id("pricerange", "cheap").unwrap();
    assert_eq!(db.stats().count_of(&[Some(italian), None, Some(cheap)]), Some(2));

    let summary = db.summary();
    assert_eq!(summary.rows, 3);
    assert_eq!(summary.unique_rows, 3);
    assert_eq!(summary.attributes, 3);
}
