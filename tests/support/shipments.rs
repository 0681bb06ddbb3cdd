use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Header with the model columns plus an extra column the pipeline should ignore.
pub const HEADER: &str = "order_id,customer_zip_code_prefix,product_weight_g,product_length_cm,product_height_cm,product_width_cm,seller_zip_code_prefix,freight_value";

/// Deterministic synthetic shipment whose freight grows with weight and distance.
pub fn shipment(i: usize) -> (f64, f64, f64, f64, f64, f64, f64) {
    let customer_zip = 1000.0 + ((i * 7919) % 90000) as f64;
    let weight = 100.0 + ((i * 37) % 2000) as f64;
    let length = 10.0 + (i % 40) as f64;
    let height = 2.0 + (i % 25) as f64;
    let width = 8.0 + (i % 30) as f64;
    let seller_zip = 1000.0 + ((i * 104_729) % 90000) as f64;
    let distance = (customer_zip - seller_zip).abs() / 1000.0;
    let freight = 8.0 + weight * 0.01 + distance * 0.2 + (length * height * width) / 2000.0;
    (customer_zip, weight, length, height, width, seller_zip, freight)
}

pub fn shipments_csv(rows: usize) -> String {
    let mut csv = String::from(HEADER);
    csv.push('\n');
    for i in 0..rows {
        let (c, w, l, h, wd, s, f) = shipment(i);
        let _ = writeln!(csv, "o{i},{c},{w},{l},{h},{wd},{s},{f:.2}");
    }
    csv
}

pub fn write_csv(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write csv");
    path
}

/// Range of the freight values as written to the CSV (rounded to cents).
pub fn freight_range(rows: usize) -> (f64, f64) {
    (0..rows)
        .map(|i| format!("{:.2}", shipment(i).6).parse::<f64>().expect("formatted float"))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), f| (lo.min(f), hi.max(f)))
}
