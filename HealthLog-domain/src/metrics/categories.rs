use serde::{Deserialize, Serialize};

use super::Gender;

/// WHO-style BMI bands with exclusive upper bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    /// Display label shown to users
    pub fn label(&self) -> &'static str {
        match self {
            BmiCategory::Underweight => "น้ำหนักน้อย",
            BmiCategory::Normal => "น้ำหนักปกติ",
            BmiCategory::Overweight => "น้ำหนักเกิน",
            BmiCategory::Obese => "อ้วน",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum BodyFatCategory {
    TooLow,
    Athlete,
    Fit,
    Normal,
    High,
}

impl BodyFatCategory {
    pub fn label(&self) -> &'static str {
        match self {
            BodyFatCategory::TooLow => "ต่ำเกินไป",
            BodyFatCategory::Athlete => "นักกีฬา",
            BodyFatCategory::Fit => "ฟิต",
            BodyFatCategory::Normal => "ปกติ",
            BodyFatCategory::High => "สูง",
        }
    }
}

/// Classify a BMI value. Total over all reals.
pub fn bmi_category(bmi: f64) -> BmiCategory {
    if bmi < 18.5 {
        BmiCategory::Underweight
    } else if bmi < 25.0 {
        BmiCategory::Normal
    } else if bmi < 30.0 {
        BmiCategory::Overweight
    } else {
        BmiCategory::Obese
    }
}

/// Classify a body-fat percentage. `other` uses the male ladder.
pub fn body_fat_category(body_fat_percentage: f64, gender: Gender) -> BodyFatCategory {
    let [too_low, athlete, fit, normal] = match gender {
        Gender::Female => [14.0, 21.0, 25.0, 32.0],
        Gender::Male | Gender::Other => [6.0, 14.0, 18.0, 25.0],
    };

    if body_fat_percentage < too_low {
        BodyFatCategory::TooLow
    } else if body_fat_percentage < athlete {
        BodyFatCategory::Athlete
    } else if body_fat_percentage < fit {
        BodyFatCategory::Fit
    } else if body_fat_percentage < normal {
        BodyFatCategory::Normal
    } else {
        BodyFatCategory::High
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bmi_category_boundaries() {
        assert_eq!(bmi_category(18.4), BmiCategory::Underweight);
        assert_eq!(bmi_category(18.5), BmiCategory::Normal);
        assert_eq!(bmi_category(24.9), BmiCategory::Normal);
        assert_eq!(bmi_category(25.0), BmiCategory::Overweight);
        assert_eq!(bmi_category(29.9), BmiCategory::Overweight);
        assert_eq!(bmi_category(30.0), BmiCategory::Obese);
        assert_eq!(bmi_category(-1.0), BmiCategory::Underweight);
    }

    #[test]
    fn test_bmi_labels() {
        assert_eq!(bmi_category(22.9).label(), "น้ำหนักปกติ");
        assert_eq!(bmi_category(31.0).label(), "อ้วน");
    }

    #[test]
    fn test_body_fat_male_ladder() {
        assert_eq!(body_fat_category(5.9, Gender::Male), BodyFatCategory::TooLow);
        assert_eq!(body_fat_category(6.0, Gender::Male), BodyFatCategory::Athlete);
        assert_eq!(body_fat_category(14.0, Gender::Male), BodyFatCategory::Fit);
        assert_eq!(body_fat_category(18.0, Gender::Male), BodyFatCategory::Normal);
        assert_eq!(body_fat_category(25.0, Gender::Male), BodyFatCategory::High);
    }

    #[test]
    fn test_body_fat_female_ladder() {
        assert_eq!(body_fat_category(13.9, Gender::Female), BodyFatCategory::TooLow);
        assert_eq!(body_fat_category(20.9, Gender::Female), BodyFatCategory::Athlete);
        assert_eq!(body_fat_category(24.0, Gender::Female), BodyFatCategory::Fit);
        assert_eq!(body_fat_category(31.9, Gender::Female), BodyFatCategory::Normal);
        assert_eq!(body_fat_category(32.0, Gender::Female), BodyFatCategory::High);
    }

    #[test]
    fn test_other_uses_male_ladder() {
        for bf in [3.0, 10.0, 16.0, 20.0, 30.0] {
            assert_eq!(body_fat_category(bf, Gender::Other), body_fat_category(bf, Gender::Male));
        }
        assert_eq!(body_fat_category(20.0, Gender::Other).label(), "ปกติ");
    }
}
