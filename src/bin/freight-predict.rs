//! Score one shipment with a trained freight model.

use std::path::PathBuf;

use freight_pricing::FeatureRow;
use freight_pricing::predict::predict_freight;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

#[derive(Debug, Clone)]
struct CliOptions {
    model_path: PathBuf,
    row: FeatureRow,
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let predicted = predict_freight(&options.row, &options.model_path).map_err(|err| err.to_string())?;

    let row = &options.row;
    println!("customer zip: {}", row.customer_zip_code_prefix);
    println!("seller zip:   {}", row.seller_zip_code_prefix);
    println!("weight:       {}g", row.product_weight_g);
    println!(
        "dimensions:   {}cm x {}cm x {}cm",
        row.product_length_cm, row.product_height_cm, row.product_width_cm
    );
    println!("predicted freight value: ${predicted:.2}");
    Ok(())
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut options = CliOptions {
        model_path: PathBuf::from("freight_pricing_model.bin"),
        row: FeatureRow {
            customer_zip_code_prefix: 28013.0,
            product_weight_g: 650.0,
            product_length_cm: 28.0,
            product_height_cm: 9.0,
            product_width_cm: 14.0,
            seller_zip_code_prefix: 27277.0,
        },
    };

    let mut idx = 0usize;
    while idx < args.len() {
        let flag = args[idx].as_str();
        if matches!(flag, "-h" | "--help") {
            return Err(help_text());
        }
        idx += 1;
        let value = args
            .get(idx)
            .ok_or_else(|| format!("{flag} requires a value"))?;
        let row = &mut options.row;
        match flag {
            "--model" => options.model_path = PathBuf::from(value),
            "--customer-zip" => row.customer_zip_code_prefix = parse_value(flag, value)?,
            "--weight" => row.product_weight_g = parse_value(flag, value)?,
            "--length" => row.product_length_cm = parse_value(flag, value)?,
            "--height" => row.product_height_cm = parse_value(flag, value)?,
            "--width" => row.product_width_cm = parse_value(flag, value)?,
            "--seller-zip" => row.seller_zip_code_prefix = parse_value(flag, value)?,
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(options)
}

fn parse_value(flag: &str, value: &str) -> Result<f64, String> {
    value
        .parse::<f64>()
        .map_err(|_| format!("Invalid {flag} value: {value}"))
}

fn help_text() -> String {
    [
        "freight-predict",
        "",
        "Predicts the freight value of one shipment with a model written by freight-train.",
        "",
        "Usage:",
        "  freight-predict [--model freight_pricing_model.bin] [feature options]",
        "",
        "Options:",
        "  --model <file>        Model artifact (default: freight_pricing_model.bin).",
        "  --customer-zip <n>    Customer postal-code prefix (default: 28013).",
        "  --weight <g>          Product weight in grams (default: 650).",
        "  --length <cm>         Product length (default: 28).",
        "  --height <cm>         Product height (default: 9).",
        "  --width <cm>          Product width (default: 14).",
        "  --seller-zip <n>      Seller postal-code prefix (default: 27277).",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_single_feature() {
        let options = parse_args(vec!["--weight".into(), "1200".into()]).unwrap();
        assert_eq!(options.row.product_weight_g, 1200.0);
        assert_eq!(options.row.customer_zip_code_prefix, 28013.0);
        assert_eq!(options.model_path, PathBuf::from("freight_pricing_model.bin"));
    }

    #[test]
    fn rejects_non_numeric_feature() {
        assert!(parse_args(vec!["--width".into(), "wide".into()]).is_err());
    }
}
