use chrono::{Datelike, Local, NaiveDate};

use super::{round_to_tenth, ActivityLevel, Demographics, Gender, MetricsError, WeightRange};

/// Age in whole years on the local calendar date
pub fn calculate_age(date_of_birth: NaiveDate) -> u32 {
    calculate_age_on(date_of_birth, Local::now().date_naive())
}

/// Age in whole years on `today`. The year difference is decremented when the
/// birthday has not been reached yet; a future birth date yields 0.
pub fn calculate_age_on(date_of_birth: NaiveDate, today: NaiveDate) -> u32 {
    let mut age = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }
    age.max(0) as u32
}

/// BMI = kg / m², rounded to one decimal
pub fn calculate_bmi(weight_kg: f64, height_cm: f64) -> Result<f64, MetricsError> {
    if height_cm <= 0.0 {
        return Err(MetricsError::ArithmeticDegenerate("height must be greater than zero"));
    }
    let height_m = height_cm / 100.0;
    Ok(round_to_tenth(weight_kg / (height_m * height_m)))
}

/// Basal metabolic rate (Mifflin-St Jeor) on the local calendar date
pub fn calculate_bmr(demographics: &Demographics, weight_kg: f64) -> i32 {
    calculate_bmr_on(demographics, weight_kg, Local::now().date_naive())
}

/// Basal metabolic rate (Mifflin-St Jeor) with the age taken on `today`.
/// `other` uses the mean of the male and female offsets.
pub fn calculate_bmr_on(demographics: &Demographics, weight_kg: f64, today: NaiveDate) -> i32 {
    let age = calculate_age_on(demographics.date_of_birth, today) as f64;
    let base = 10.0 * weight_kg + 6.25 * demographics.height - 5.0 * age;

    let offset = match demographics.gender {
        Gender::Male => 5.0,
        Gender::Female => -161.0,
        Gender::Other => -78.0,
    };

    (base + offset).round() as i32
}

/// Total daily energy expenditure for a BMR and activity level
pub fn calculate_tdee(bmr: i32, activity_level: ActivityLevel) -> i32 {
    (bmr as f64 * activity_level.multiplier()).round() as i32
}

/// Weight range that keeps BMI within [18.5, 24.9]
pub fn ideal_weight_range(height_cm: f64) -> Result<WeightRange, MetricsError> {
    if height_cm <= 0.0 {
        return Err(MetricsError::ArithmeticDegenerate("height must be greater than zero"));
    }
    let height_m = height_cm / 100.0;
    let squared = height_m * height_m;

    Ok(WeightRange {
        min: round_to_tenth(18.5 * squared),
        max: round_to_tenth(24.9 * squared),
    })
}

/// Estimate total weight from muscle mass and body-fat percentage
pub fn estimate_weight(muscle_mass_kg: f64, body_fat_percentage: f64) -> Result<f64, MetricsError> {
    if body_fat_percentage >= 100.0 {
        return Err(MetricsError::ArithmeticDegenerate("body fat percentage must be below 100"));
    }
    Ok(round_to_tenth(muscle_mass_kg / (1.0 - body_fat_percentage / 100.0)))
}
