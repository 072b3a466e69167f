//! Shared data for the unit tests.

use crate::table::Table;
use crate::Vector;

const STACKLOSS: [[f64; 4]; 21] = [
    [80.0, 27.0, 89.0, 42.0],
    [80.0, 27.0, 88.0, 37.0],
    [75.0, 25.0, 90.0, 37.0],
    [62.0, 24.0, 87.0, 28.0],
    [62.0, 22.0, 87.0, 18.0],
    [62.0, 23.0, 87.0, 18.0],
    [62.0, 24.0, 93.0, 19.0],
    [62.0, 24.0, 93.0, 20.0],
    [58.0, 23.0, 87.0, 15.0],
    [58.0, 18.0, 80.0, 14.0],
    [58.0, 18.0, 89.0, 14.0],
    [58.0, 17.0, 88.0, 13.0],
    [58.0, 18.0, 82.0, 11.0],
    [58.0, 19.0, 93.0, 12.0],
    [50.0, 18.0, 89.0, 8.0],
    [50.0, 18.0, 86.0, 7.0],
    [50.0, 19.0, 72.0, 8.0],
    [50.0, 19.0, 79.0, 8.0],
    [50.0, 20.0, 80.0, 9.0],
    [56.0, 20.0, 82.0, 15.0],
    [70.0, 20.0, 91.0, 15.0],
];

/// Brownlee's stack loss plant data: air flow, water temperature and acid
/// concentration against stack loss.
pub(crate) fn stackloss() -> (Table, Vector) {
    let rows: Vec<Vec<f64>> = STACKLOSS.iter().map(|r| r[..3].to_vec()).collect();
    let table = Table::from_rows(&rows)
        .unwrap()
        .with_labels(vec!["air".into(), "water".into(), "acid".into()])
        .unwrap();
    let y = STACKLOSS.iter().map(|r| r[3]).collect();
    (table, y)
}

pub(crate) fn assert_close(got: f64, want: f64, tol: f64) {
    assert!(
        (got - want).abs() < tol,
        "expected {} within {}, got {}",
        want,
        tol,
        got
    );
}
