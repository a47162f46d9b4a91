mod common;

use chrono::Duration;
use common::{converged_settings, linear_prices, request, start_date, trained_settings};
use pricecast::application::forecasting::statistical::StatisticalForecaster;
use pricecast::application::forecasting::{CancellationFlag, ForecastService};
use pricecast::domain::errors::ForecastError;
use pricecast::domain::forecasting::{ENSEMBLE_LABEL, ModelType};

#[tokio::test]
async fn test_linear_history_ten_day_ensemble() {
    let prices = linear_prices(120);
    let service = ForecastService::new(trained_settings());

    let result = service.forecast(&request(&prices, 10, None)).await.unwrap();

    assert_eq!(result.horizon(), 10);
    assert_eq!(result.model_type, ENSEMBLE_LABEL);
    let last_day = start_date() + Duration::days(119);
    for (i, point) in result.predictions.iter().enumerate() {
        assert_eq!(point.date, last_day + Duration::days(i as i64 + 1));
        assert_eq!(point.model, ENSEMBLE_LABEL);
        assert!(point.price > 0.0 && point.price.is_finite());
        assert!((40..=100).contains(&point.confidence));
    }
    assert!((40.0..=100.0).contains(&result.accuracy));
}

#[tokio::test]
async fn test_linear_history_forecast_keeps_rising() {
    let prices = linear_prices(120);
    let last = *prices.last().unwrap();
    let service = ForecastService::new(converged_settings());

    let forecast = service
        .forecast(&request(&prices, 10, None))
        .await
        .unwrap()
        .prices();

    assert_eq!(forecast.len(), 10);
    assert!(
        forecast.windows(2).all(|w| w[1] >= w[0]),
        "forecast dips: {:?}",
        forecast
    );
    assert!(
        (forecast[0] - last).abs() / last < 0.05,
        "first day {} too far from last close {}",
        forecast[0],
        last
    );
}

#[test]
fn test_statistical_path_continues_the_increase() {
    let prices = linear_prices(120);
    let model = StatisticalForecaster::new()
        .train(&prices, &CancellationFlag::new())
        .unwrap();

    let forecast = model.forecast(10);
    let forecast_mean = forecast.iter().sum::<f64>() / 10.0;
    let recent_mean = prices[110..].iter().sum::<f64>() / 10.0;
    assert!(
        forecast_mean > recent_mean,
        "{} <= {}",
        forecast_mean,
        recent_mean
    );
}

#[tokio::test]
async fn test_constant_history_stays_flat() {
    let prices = vec![250.0; 100];
    let service = ForecastService::new(trained_settings());

    let result = service.forecast(&request(&prices, 5, None)).await.unwrap();

    assert_eq!(result.horizon(), 5);
    for point in &result.predictions {
        assert!((point.price - 250.0).abs() < 1e-6, "price {}", point.price);
        assert!((40..=100).contains(&point.confidence));
    }
}

#[tokio::test]
async fn test_confidence_decays_with_horizon() {
    let prices = linear_prices(130);
    let service = ForecastService::new(trained_settings());

    let result = service.forecast(&request(&prices, 14, None)).await.unwrap();
    let confidences: Vec<u8> = result.predictions.iter().map(|p| p.confidence).collect();
    assert!(confidences.windows(2).all(|w| w[1] <= w[0]), "{:?}", confidences);
}

#[tokio::test]
async fn test_short_history_is_rejected() {
    let prices = linear_prices(99);
    let service = ForecastService::new(trained_settings());

    match service.forecast(&request(&prices, 7, None)).await {
        Err(ForecastError::InsufficientData {
            required,
            available,
        }) => {
            assert_eq!(required, 100);
            assert_eq!(available, 99);
        }
        other => panic!("expected InsufficientData, got {:?}", other),
    }
}

#[tokio::test]
async fn test_model_type_does_not_change_trained_label() {
    let prices = linear_prices(110);
    let service = ForecastService::new(trained_settings());

    let result = service
        .forecast(&request(&prices, 3, Some(ModelType::Arima)))
        .await
        .unwrap();
    assert_eq!(result.model_type, ENSEMBLE_LABEL);
}
