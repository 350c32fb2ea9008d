//! Loan servicing simulation — repayment schedule and days past due.
//!
//! The demo has no repayment feed. A loan is modelled as starting
//! `start_months_ago` months before the as-of date, with equal monthly
//! instalments. Instalment 1 falls due on the start date and each later one
//! a month after the previous. The first `paid_instalments` are paid.
//! Days past due counts from the earliest unpaid instalment already due.

use crate::{config::LoanSimulationConfig, types::Amount};
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Delinquency bands by days past due.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DpdGrade {
    Performing,
    Watch,
    Substandard,
    Doubtful,
    Lost,
}

impl DpdGrade {
    pub fn from_days(days_past_due: u32) -> Self {
        match days_past_due {
            0 => Self::Performing,
            1..=89 => Self::Watch,
            90..=179 => Self::Substandard,
            180..=359 => Self::Doubtful,
            _ => Self::Lost,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoanPosition {
    pub days_past_due: u32,
    pub grade: DpdGrade,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Instalment {
    pub number: u32,
    pub due_date: NaiveDate,
    pub amount: Amount,
    pub paid: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RepaymentSchedule {
    pub start_date: NaiveDate,
    pub as_of: NaiveDate,
    pub instalments: Vec<Instalment>,
    pub days_past_due: u32,
    pub grade: DpdGrade,
}

impl RepaymentSchedule {
    pub fn simulate(
        loan_amount: Amount,
        tenure_months: u32,
        as_of: NaiveDate,
        sim: &LoanSimulationConfig,
    ) -> Self {
        let tenure = tenure_months.max(1);
        let start_date = as_of
            .checked_sub_months(Months::new(sim.start_months_ago))
            .unwrap_or(as_of);

        let regular = (loan_amount / f64::from(tenure) * 100.0).round() / 100.0;
        let mut instalments = Vec::with_capacity(tenure as usize);
        let mut allocated = 0.0;
        for number in 1..=tenure {
            let due_date = start_date
                .checked_add_months(Months::new(number - 1))
                .unwrap_or(start_date);
            // The last instalment absorbs rounding.
            let amount = if number == tenure {
                ((loan_amount - allocated) * 100.0).round() / 100.0
            } else {
                regular
            };
            allocated += amount;
            instalments.push(Instalment {
                number,
                due_date,
                amount,
                paid: number <= sim.paid_instalments,
            });
        }

        let days_past_due = instalments
            .iter()
            .find(|i| !i.paid && i.due_date < as_of)
            .map(|i| (as_of - i.due_date).num_days().max(0) as u32)
            .unwrap_or(0);

        Self {
            start_date,
            as_of,
            instalments,
            days_past_due,
            grade: DpdGrade::from_days(days_past_due),
        }
    }

    pub fn outstanding(&self) -> Amount {
        self.instalments
            .iter()
            .filter(|i| !i.paid)
            .map(|i| i.amount)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim() -> LoanSimulationConfig {
        LoanSimulationConfig {
            start_months_ago: 3,
            paid_instalments: 2,
        }
    }

    #[test]
    fn grading_bands() {
        assert_eq!(DpdGrade::from_days(0), DpdGrade::Performing);
        assert_eq!(DpdGrade::from_days(1), DpdGrade::Watch);
        assert_eq!(DpdGrade::from_days(89), DpdGrade::Watch);
        assert_eq!(DpdGrade::from_days(90), DpdGrade::Substandard);
        assert_eq!(DpdGrade::from_days(180), DpdGrade::Doubtful);
        assert_eq!(DpdGrade::from_days(360), DpdGrade::Lost);
    }

    #[test]
    fn third_instalment_is_overdue() {
        let as_of = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let schedule = RepaymentSchedule::simulate(1_200_000.0, 12, as_of, &sim());

        assert_eq!(schedule.start_date, NaiveDate::from_ymd_opt(2025, 3, 15).unwrap());
        assert_eq!(schedule.instalments.len(), 12);
        assert!(schedule.instalments[0].paid && schedule.instalments[1].paid);
        assert!(!schedule.instalments[2].paid);
        // Instalment 3 fell due on 2025-05-15.
        assert_eq!(schedule.days_past_due, 31);
        assert_eq!(schedule.grade, DpdGrade::Watch);
        assert!((schedule.outstanding() - 1_000_000.0).abs() < 0.01);
    }

    #[test]
    fn rounding_lands_on_last_instalment() {
        let as_of = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let schedule = RepaymentSchedule::simulate(1_000_000.0, 3, as_of, &sim());
        let total: f64 = schedule.instalments.iter().map(|i| i.amount).sum();
        assert!((total - 1_000_000.0).abs() < 0.001);
    }

    #[test]
    fn fully_paid_loan_is_performing() {
        let as_of = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let schedule = RepaymentSchedule::simulate(500_000.0, 2, as_of, &sim());
        assert_eq!(schedule.days_past_due, 0);
        assert_eq!(schedule.grade, DpdGrade::Performing);
    }
}
