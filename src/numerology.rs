use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

pub const MASTER_NUMBERS: [u32; 3] = [11, 22, 33];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumerologyProfile {
    pub life_path_number: u32,
    pub birthday_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub life_path_base: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthday_base: Option<u32>,
    pub life_path_entity_id: String,
    pub birthday_entity_id: String,
}

fn digit_sum(mut n: u32) -> u32 {
    let mut sum = 0;
    while n > 0 {
        sum += n % 10;
        n /= 10;
    }
    sum
}

pub fn is_master_number(n: u32) -> bool {
    MASTER_NUMBERS.contains(&n)
}

/// Repeated digit sum down to 1..=9, stopping early at 11, 22 or 33.
pub fn reduce(mut n: u32) -> u32 {
    while n > 9 && !is_master_number(n) {
        n = digit_sum(n);
    }
    n
}

/// Base digit of a master number: 11 → 2, 22 → 4, 33 → 6.
pub fn master_base(n: u32) -> Option<u32> {
    is_master_number(n).then(|| digit_sum(n))
}

/// Sum of every digit of `YYYYMMDD`, reduced.
pub fn life_path_number(date: NaiveDate) -> u32 {
    let digits = digit_sum(date.year().unsigned_abs())
        + digit_sum(date.month())
        + digit_sum(date.day());
    reduce(digits)
}

pub fn birthday_number(date: NaiveDate) -> u32 {
    reduce(date.day())
}

pub fn entity_id(n: u32) -> String {
    format!("num-{}", n)
}

pub fn calculate_numerology_profile(date: NaiveDate) -> NumerologyProfile {
    let life_path = life_path_number(date);
    let birthday = birthday_number(date);
    NumerologyProfile {
        life_path_number: life_path,
        birthday_number: birthday,
        life_path_base: master_base(life_path),
        birthday_base: master_base(birthday),
        life_path_entity_id: entity_id(life_path),
        birthday_entity_id: entity_id(birthday),
    }
}
