use reglin::preprocessing::{add_bias_column, StandardScaler};
use reglin::{cost, fit, gradient, metrics, RegularizedLinearRegression};
use ndarray::array;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Regularized Linear Regression (conjugate gradient) ===\n");

    // y = 3*x1 + 2*x2 + small noise, x3 is irrelevant
    let features = array![
        [1.0, 2.0, 0.5],
        [2.0, 3.0, -0.2],
        [3.0, 1.0, 1.1],
        [4.0, 4.0, 0.3],
        [5.0, 2.0, -0.8],
        [6.0, 5.0, 0.9],
        [7.0, 3.0, -0.4],
        [8.0, 6.0, 0.7]
    ];
    let y = array![7.1, 11.9, 12.8, 19.7, 18.9, 27.8, 26.7, 35.9];

    let mut scaler = StandardScaler::new();
    let x = add_bias_column(&scaler.fit_transform(&features)?);

    let zeros = ndarray::Array1::zeros(x.ncols());
    println!("Cost at zero weights: {:.4}", cost(&zeros, &x, &y, 0.0)?);
    println!("Gradient at zero weights: {:.4}\n", gradient(&zeros, &x, &y, 0.0)?);

    println!(
        "{:<12} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "lambda", "bias", "w1", "w2", "w3", "MSE"
    );
    println!("{}", "-".repeat(67));

    for lambda in [0.0, 0.1, 1.0, 10.0, 100.0] {
        let theta = fit(&x, &y, lambda)?;
        let predictions = x.dot(&theta);
        let mse = metrics::mean_squared_error(&y, &predictions)?;

        println!(
            "{:<12} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>10.4}",
            lambda, theta[0], theta[1], theta[2], theta[3], mse
        );
    }

    let mut model = RegularizedLinearRegression::new().lambda(1.0);
    model.fit(&x, &y)?;
    println!("\nR² with lambda=1: {:.4}", model.score(&x, &y)?);
    if let Some(report) = &model.report {
        println!("Fit report: {:?}", report);
    }

    println!("\nObservations:");
    println!("• Larger lambda shrinks w1..w3 towards zero");
    println!("• The bias weight is never penalized, so it stays near the mean of y");

    Ok(())
}
