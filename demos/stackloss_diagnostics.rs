use ndarray::array;
use tabular_lm::{diagnostics, OlsTrainer, Parallelism, Table, Trainer};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Stack Loss Regression Diagnostics ===\n");

    let table = Table::from_rows(&[
        vec![80.0, 27.0, 89.0],
        vec![80.0, 27.0, 88.0],
        vec![75.0, 25.0, 90.0],
        vec![62.0, 24.0, 87.0],
        vec![62.0, 22.0, 87.0],
        vec![62.0, 23.0, 87.0],
        vec![62.0, 24.0, 93.0],
        vec![62.0, 24.0, 93.0],
        vec![58.0, 23.0, 87.0],
        vec![58.0, 18.0, 80.0],
        vec![58.0, 18.0, 89.0],
        vec![58.0, 17.0, 88.0],
        vec![58.0, 18.0, 82.0],
        vec![58.0, 19.0, 93.0],
        vec![50.0, 18.0, 89.0],
        vec![50.0, 18.0, 86.0],
        vec![50.0, 19.0, 72.0],
        vec![50.0, 19.0, 79.0],
        vec![50.0, 20.0, 80.0],
        vec![56.0, 20.0, 82.0],
        vec![70.0, 20.0, 91.0],
    ])?
    .with_labels(vec!["air".into(), "water".into(), "acid".into()])?;
    let y = array![
        42.0, 37.0, 37.0, 28.0, 18.0, 18.0, 19.0, 20.0, 15.0, 14.0, 14.0, 13.0, 11.0, 12.0, 8.0,
        7.0, 8.0, 8.0, 9.0, 15.0, 15.0
    ];

    let (_, summary) = OlsTrainer::new().train(table, &y)?;
    println!("{}\n", summary);

    let parallelism = Parallelism::default();
    let leverage = diagnostics::leverage_points(&summary)?;
    let cooks = diagnostics::cooks_distance(&summary, parallelism)?;
    let studentized = diagnostics::studentized_residuals(&summary)?;
    let dffits = diagnostics::dffits(&summary, parallelism)?;

    println!(
        "{:<5} {:>10} {:>10} {:>12} {:>10}",
        "Row", "Leverage", "Cook's D", "Studentized", "DFFITS"
    );
    println!("{}", "-".repeat(51));
    for i in 0..summary.observations() {
        println!(
            "{:<5} {:>10.4} {:>10.4} {:>12.4} {:>10.4}",
            i, leverage[i], cooks[i], studentized[i], dffits[i]
        );
    }

    println!(
        "\nHigh leverage rows: {:?}",
        diagnostics::high_leverage_points(&summary)?
    );
    println!(
        "Variance inflation factors: {:.4}",
        diagnostics::variance_inflation_factors(&summary)?
    );

    let acid = summary.data().col_index("acid")?;
    let test = diagnostics::f_test(&summary, &[acid])?;
    println!(
        "Dropping acid: F = {:.4} on {} and {} DF, p-value = {:.4}",
        test.f, test.df_num, test.df_den, test.p_value
    );
    println!(
        "Durbin-Watson: {:.4}, AIC: {:.4}, BIC: {:.4}",
        diagnostics::durbin_watson(&summary),
        diagnostics::aic(&summary),
        diagnostics::bic(&summary)
    );

    Ok(())
}
