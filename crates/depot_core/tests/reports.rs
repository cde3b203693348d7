use depot_core::model::facility::{Locality, Section};
use depot_core::model::order::{InboundOrder, PurchaseOrder};
use depot_core::model::party::{Buyer, Carrier, Employee, Seller};
use depot_core::model::product::{Product, ProductBatch, ProductRecord};
use depot_core::service::report::{
    BuyerPurchaseOrdersReport, EmployeeInboundOrdersReport, LocalityCarriersReport,
    LocalitySellersReport, ProductRecordsReport, SectionProductsReport,
};
use depot_core::storage::StorageLayout;
use depot_core::{
    AggregateRecord, Depot, DepotConfig, EntityKind, ServiceError, StorageConfig,
};
use tempfile::TempDir;

struct Fixture {
    name: &'static str,
    depot: Depot,
    _dir: Option<TempDir>,
}

fn depots() -> Vec<Fixture> {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = Depot::with_layout(&StorageLayout::Snapshot(dir.path().to_path_buf())).unwrap();
    let rows = Depot::open(&DepotConfig {
        storage: StorageConfig::SqliteMemory,
        logging: None,
    })
    .unwrap();

    vec![
        Fixture {
            name: "memory",
            depot: Depot::in_memory(),
            _dir: None,
        },
        Fixture {
            name: "snapshot",
            depot: snapshot,
            _dir: Some(dir),
        },
        Fixture {
            name: "row",
            depot: rows,
            _dir: None,
        },
    ]
}

fn employee(card: &str) -> Employee {
    Employee {
        id: 0,
        card_number_id: card.to_string(),
        first_name: "Ana".to_string(),
        last_name: "Gomez".to_string(),
        warehouse_id: 0,
    }
}

fn inbound_order(number: &str, employee_id: i64) -> InboundOrder {
    InboundOrder {
        id: 0,
        order_number: number.to_string(),
        order_date: "2021-04-04".to_string(),
        employee_id,
        product_batch_id: 0,
        warehouse_id: 0,
    }
}

fn locality(name: &str) -> Locality {
    Locality {
        id: 0,
        locality_name: name.to_string(),
        province_name: "Buenos Aires".to_string(),
        country_name: "Argentina".to_string(),
    }
}

fn seller(cid: i64, locality_id: i64) -> Seller {
    Seller {
        id: 0,
        cid,
        company_name: "Meli".to_string(),
        address: "Calle 1".to_string(),
        telephone: "1155550000".to_string(),
        locality_id,
    }
}

fn carrier(cid: &str, locality_id: i64) -> Carrier {
    Carrier {
        id: 0,
        cid: cid.to_string(),
        company_name: "Andreani".to_string(),
        address: "Calle 2".to_string(),
        telephone: "1155550001".to_string(),
        locality_id,
    }
}

fn section(number: i64) -> Section {
    Section {
        section_number: number,
        current_capacity: 10,
        minimum_capacity: 5,
        maximum_capacity: 50,
        ..Section::default()
    }
}

fn batch(number: i64, section_id: i64, quantity: i64) -> ProductBatch {
    ProductBatch {
        batch_number: number,
        current_quantity: quantity,
        initial_quantity: quantity,
        due_date: "2022-01-01".to_string(),
        manufacturing_date: "2021-01-01".to_string(),
        manufacturing_hour: 10,
        section_id,
        ..ProductBatch::default()
    }
}

fn product(code: &str) -> Product {
    Product {
        product_code: code.to_string(),
        description: format!("product {code}"),
        ..Product::default()
    }
}

fn product_record(product_id: i64) -> ProductRecord {
    ProductRecord {
        id: 0,
        last_update_date: "2021-06-01".to_string(),
        purchase_price: 10.5,
        sale_price: 15.0,
        product_id,
    }
}

fn buyer(card: &str) -> Buyer {
    Buyer {
        id: 0,
        card_number_id: card.to_string(),
        first_name: "Jhon".to_string(),
        last_name: "Doe".to_string(),
    }
}

fn purchase_order(number: &str, buyer_id: i64) -> PurchaseOrder {
    PurchaseOrder {
        id: 0,
        order_number: number.to_string(),
        order_date: "2021-07-07".to_string(),
        tracking_code: format!("TRK-{number}"),
        order_status_id: 1,
        buyer_id,
        product_record_id: 0,
    }
}

/// Nine employees; two orders for employee 4, one for employee 9.
fn seed_employee_orders(depot: &Depot) {
    for card in 1..=9 {
        depot.create(employee(&format!("E{card}"))).unwrap();
    }
    depot.create(inbound_order("IO-1", 4)).unwrap();
    depot.create(inbound_order("IO-2", 4)).unwrap();
    depot.create(inbound_order("IO-3", 9)).unwrap();
}

#[test]
fn filtered_report_counts_children_of_one_parent() {
    for fixture in depots() {
        seed_employee_orders(&fixture.depot);

        let rows = fixture
            .depot
            .report::<EmployeeInboundOrdersReport>(4)
            .unwrap();

        assert_eq!(rows.len(), 1, "backend {}", fixture.name);
        assert_eq!(rows[0].id, 4);
        assert_eq!(rows[0].card_number_id, "E4");
        assert_eq!(rows[0].inbound_orders_count, 2);
    }
}

#[test]
fn unfiltered_report_groups_every_parent_with_children() {
    for fixture in depots() {
        seed_employee_orders(&fixture.depot);

        let rows = fixture
            .depot
            .report::<EmployeeInboundOrdersReport>(0)
            .unwrap();
        let totals: Vec<_> = rows.iter().map(|row| (row.id, row.count())).collect();

        assert_eq!(totals, vec![(4, 2), (9, 1)], "backend {}", fixture.name);
    }
}

#[test]
fn parent_without_children_is_zero_when_filtered_and_absent_otherwise() {
    for fixture in depots() {
        seed_employee_orders(&fixture.depot);

        let filtered = fixture
            .depot
            .report::<EmployeeInboundOrdersReport>(1)
            .unwrap();
        assert_eq!(filtered.len(), 1, "backend {}", fixture.name);
        assert_eq!(filtered[0].id, 1);
        assert_eq!(filtered[0].inbound_orders_count, 0);

        let unfiltered = fixture
            .depot
            .report::<EmployeeInboundOrdersReport>(0)
            .unwrap();
        assert!(unfiltered.iter().all(|row| row.id != 1));
    }
}

#[test]
fn unfiltered_total_equals_sum_of_filtered_counts() {
    for fixture in depots() {
        seed_employee_orders(&fixture.depot);
        let depot = &fixture.depot;

        let grouped: i64 = depot
            .report::<EmployeeInboundOrdersReport>(0)
            .unwrap()
            .iter()
            .map(|row| row.count())
            .sum();
        let per_parent: i64 = depot
            .list::<Employee>()
            .unwrap()
            .iter()
            .map(|employee| {
                depot
                    .report::<EmployeeInboundOrdersReport>(employee.id)
                    .unwrap()[0]
                    .count()
            })
            .sum();

        assert_eq!(grouped, 3, "backend {}", fixture.name);
        assert_eq!(grouped, per_parent, "backend {}", fixture.name);
    }
}

#[test]
fn unknown_parent_is_not_found() {
    for fixture in depots() {
        seed_employee_orders(&fixture.depot);

        let err = fixture
            .depot
            .report::<EmployeeInboundOrdersReport>(99)
            .unwrap_err();

        assert!(
            matches!(
                err,
                ServiceError::NotFound {
                    kind: EntityKind::Employee,
                    id: 99
                }
            ),
            "backend {}",
            fixture.name
        );
    }
}

#[test]
fn section_report_sums_current_quantity() {
    for fixture in depots() {
        let depot = &fixture.depot;
        let first = depot.create(section(100)).unwrap();
        let second = depot.create(section(200)).unwrap();
        depot.create(batch(1, first.id, 40)).unwrap();
        depot.create(batch(2, first.id, 15)).unwrap();
        depot.create(batch(3, second.id, 0)).unwrap();

        let rows = depot.report::<SectionProductsReport>(0).unwrap();
        let totals: Vec<_> = rows
            .iter()
            .map(|row| (row.section_number, row.products_count))
            .collect();

        assert_eq!(totals, vec![(100, 55), (200, 0)], "backend {}", fixture.name);
    }
}

#[test]
fn overflowing_section_total_is_a_storage_error() {
    for fixture in depots() {
        let depot = &fixture.depot;
        let crowded = depot.create(section(1)).unwrap();
        depot.create(batch(1, crowded.id, i64::MAX)).unwrap();
        depot.create(batch(2, crowded.id, 1)).unwrap();

        let err = depot.report::<SectionProductsReport>(0).unwrap_err();

        assert!(
            matches!(err, ServiceError::Storage(_)),
            "backend {}: {err}",
            fixture.name
        );
        assert_eq!(err.status_code(), 500);
    }
}

#[test]
fn children_of_deleted_parent_are_skipped() {
    for fixture in depots() {
        let depot = &fixture.depot;
        let kept = depot.create(locality("Palermo")).unwrap();
        let gone = depot.create(locality("Belgrano")).unwrap();
        depot.create(seller(1, kept.id)).unwrap();
        depot.create(seller(2, gone.id)).unwrap();
        depot.create(seller(3, gone.id)).unwrap();
        depot.delete::<Locality>(gone.id).unwrap();

        let rows = depot.report::<LocalitySellersReport>(0).unwrap();

        assert_eq!(rows.len(), 1, "backend {}", fixture.name);
        assert_eq!(rows[0].locality_name, "Palermo");
        assert_eq!(rows[0].sellers_count, 1);
    }
}

fn seed_all(depot: &Depot) {
    let palermo = depot.create(locality("Palermo")).unwrap();
    let belgrano = depot.create(locality("Belgrano")).unwrap();
    depot.create(seller(10, palermo.id)).unwrap();
    depot.create(seller(11, belgrano.id)).unwrap();
    depot.create(seller(12, belgrano.id)).unwrap();
    depot.create(carrier("CID-1", belgrano.id)).unwrap();

    let apples = depot.create(product("APL")).unwrap();
    depot.create(product("PER")).unwrap();
    depot.create(product_record(apples.id)).unwrap();
    depot.create(product_record(apples.id)).unwrap();

    let shopper = depot.create(buyer("402323")).unwrap();
    depot.create(buyer("402324")).unwrap();
    depot.create(purchase_order("PO-1", shopper.id)).unwrap();

    let cold = depot.create(section(1)).unwrap();
    depot.create(batch(7, cold.id, 12)).unwrap();

    seed_employee_orders(depot);
}

fn all_reports(depot: &Depot) -> serde_json::Value {
    serde_json::json!({
        "buyers": depot.report::<BuyerPurchaseOrdersReport>(0).unwrap(),
        "employees": depot.report::<EmployeeInboundOrdersReport>(0).unwrap(),
        "products": depot.report::<ProductRecordsReport>(0).unwrap(),
        "sections": depot.report::<SectionProductsReport>(0).unwrap(),
        "sellers": depot.report::<LocalitySellersReport>(0).unwrap(),
        "carriers": depot.report::<LocalityCarriersReport>(0).unwrap(),
    })
}

#[test]
fn sql_pushdown_matches_in_process_scan() {
    let mut outputs = Vec::new();
    for fixture in depots() {
        seed_all(&fixture.depot);
        outputs.push((fixture.name, all_reports(&fixture.depot)));
    }

    let (_, expected) = &outputs[0];
    for (name, actual) in &outputs[1..] {
        assert_eq!(actual, expected, "backend {name}");
    }
    assert_eq!(expected["products"][0]["records_count"], 2);
    assert_eq!(expected["sellers"][1]["sellers_count"], 2);
    assert_eq!(expected["carriers"][0]["locality_name"], "Belgrano");
    assert_eq!(expected["buyers"].as_array().unwrap().len(), 1);
}
