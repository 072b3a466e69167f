use ndarray::array;
use tabular_lm::metrics::r2_score;
use tabular_lm::{Model, OlsTrainer, RidgeTrainer, Table, Trainer};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Ordinary Least Squares vs Ridge ===\n");

    // y = 3*x1 + 2*x2 + noise, x3 and x4 are irrelevant
    let table = Table::from_rows(&[
        vec![1.0, 2.0, 0.5, -0.3],
        vec![2.0, 3.0, -0.2, 0.8],
        vec![3.0, 1.0, 1.1, -0.5],
        vec![4.0, 4.0, 0.3, 0.2],
        vec![5.0, 2.0, -0.8, 0.7],
        vec![6.0, 5.0, 0.9, -0.1],
        vec![7.0, 3.0, -0.4, 0.6],
        vec![8.0, 6.0, 0.7, -0.9],
        vec![9.0, 4.0, -0.1, 0.4],
        vec![10.0, 7.0, 0.2, -0.2],
    ])?
    .with_labels(vec!["x1".into(), "x2".into(), "x3".into(), "x4".into()])?;
    let y = array![7.1, 11.9, 12.8, 19.7, 18.9, 27.8, 26.7, 35.9, 34.8, 43.1];

    println!("Training data shape: {} samples, {} features", table.rows(), table.cols());
    println!("True relationship: y = 3*x1 + 2*x2 + noise (x3, x4 are irrelevant)\n");

    println!(
        "{:<18} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "Model", "R²", "Intercept", "x1", "x2", "x3", "x4"
    );
    println!("{}", "-".repeat(84));

    let (ols, _) = OlsTrainer::new().train(table.clone(), &y)?;
    print_row("OLS", &ols, &table, &y)?;

    for lambda in [0.1, 1.0, 10.0, 100.0] {
        // ridge rescales the table it is given, so hand it a copy
        let (ridge, _) = RidgeTrainer::new().lambda(lambda).train(table.clone(), &y)?;
        print_row(&format!("Ridge (λ={})", lambda), &ridge, &table, &y)?;
    }

    println!("\nHigher λ values pull every slope towards zero.");
    Ok(())
}

fn print_row(
    name: &str,
    model: &impl Model,
    table: &Table,
    y: &tabular_lm::Vector,
) -> Result<(), Box<dyn std::error::Error>> {
    let score = r2_score(y, &model.predict_table(table)?)?;
    let c = model.coefficients();
    println!(
        "{:<18} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>10.4}",
        name, score, c[0], c[1], c[2], c[3], c[4]
    );
    Ok(())
}
