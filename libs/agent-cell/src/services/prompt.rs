use chrono::NaiveDate;

use doctor_cell::DoctorSchedule;
use shared_utils::calendar::{format_long_date, resolve_relative_date};

use crate::services::clinic_tools::{BOOK_APPOINTMENT, CHECK_AVAILABILITY, GET_REPORT};

/// System instruction for one chat turn.
///
/// Rebuilt every turn so the roster and the relative dates never go stale in
/// long-lived sessions.
pub fn build_system_prompt(roster: &[DoctorSchedule], today: NaiveDate) -> String {
    let doctors = if roster.is_empty() {
        "- (roster unavailable, ask the patient which doctor they want)".to_string()
    } else {
        roster
            .iter()
            .map(|schedule| format!("- {}", schedule.describe()))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "You are an intelligent appointment scheduling assistant for a medical clinic.

Available doctors:
{doctors}

Current date: {current}

When handling dates:
- \"today\" = {today}
- \"tomorrow\" = {tomorrow}

You have access to these tools:
1. {check} - Check a doctor's free time slots on a date
2. {book} - Book a 30-minute appointment for a patient
3. {report} - Generate analytics reports (patient counts, appointment stats)

For analytics questions use {report} with the matching query_type:
- \"today_appointments\" - appointments today
- \"tomorrow_appointments\" - appointments tomorrow
- \"yesterday_visits\" - unique patients yesterday
- \"summary_report\" - full summary report

Check availability before booking. If a slot turns out to be taken, offer the patient another free slot.
Always use function calls for data retrieval. Never output raw JSON to the user.
Always be professional, friendly, and clear.",
        doctors = doctors,
        current = format_long_date(today),
        today = resolve_relative_date(today, 0),
        tomorrow = resolve_relative_date(today, 1),
        check = CHECK_AVAILABILITY,
        book = BOOK_APPOINTMENT,
        report = GET_REPORT,
    )
}
