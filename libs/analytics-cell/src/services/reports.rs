use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};

use doctor_cell::DoctorService;
use shared_database::ClinicStore;
use shared_models::Doctor;
use shared_utils::calendar::{parse_iso_date, relative_date, ISO_DATE_FORMAT};
use shared_utils::Clock;

use crate::models::{
    AppointmentCount, DailyCount, PatientVisits, RangeReport, Report, ReportError, ReportQuery,
    SummaryReport, MAX_RANGE_DAYS,
};

const ALL_DOCTORS: &str = "All Doctors";
const GENERATED_AT_FORMAT: &str = "%B %d, %Y at %I:%M %p";

pub struct ReportService {
    store: Arc<dyn ClinicStore>,
    doctors: DoctorService,
    clock: Arc<dyn Clock>,
}

impl ReportService {
    pub fn new(store: Arc<dyn ClinicStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            doctors: DoctorService::new(Arc::clone(&store)),
            store,
            clock,
        }
    }

    pub async fn report(
        &self,
        query: ReportQuery,
        doctor_name: Option<&str>,
    ) -> Result<Report, ReportError> {
        debug!("Running report {} (doctor filter: {:?})", query, doctor_name);

        let report = match query {
            ReportQuery::TodayAppointments => Report::Count(self.appointments_in_days(0, doctor_name).await?),
            ReportQuery::TomorrowAppointments => Report::Count(self.appointments_in_days(1, doctor_name).await?),
            ReportQuery::YesterdayVisits => Report::Visits(self.yesterday_visits(doctor_name).await?),
            ReportQuery::SummaryReport => Report::Summary(self.summary_report(doctor_name).await?),
        };

        Ok(report)
    }

    /// Scheduled appointments on today + `offset_days`.
    pub async fn appointments_in_days(
        &self,
        offset_days: i64,
        doctor_name: Option<&str>,
    ) -> Result<AppointmentCount, ReportError> {
        let doctor = self.doctor_filter(doctor_name).await?;
        let date = relative_date(self.clock.today(), offset_days);
        self.count_on(date, doctor.as_ref()).await
    }

    /// Distinct patients (by email) with a scheduled appointment yesterday.
    pub async fn yesterday_visits(&self, doctor_name: Option<&str>) -> Result<PatientVisits, ReportError> {
        let doctor = self.doctor_filter(doctor_name).await?;
        let date = relative_date(self.clock.today(), -1);
        self.visits_on(date, doctor.as_ref()).await
    }

    pub async fn summary_report(&self, doctor_name: Option<&str>) -> Result<SummaryReport, ReportError> {
        let doctor = self.doctor_filter(doctor_name).await?;
        let now = self.clock.now();
        let today = now.date();

        let yesterday = self.visits_on(relative_date(today, -1), doctor.as_ref()).await?;
        let today_count = self.count_on(today, doctor.as_ref()).await?;
        let tomorrow_count = self.count_on(relative_date(today, 1), doctor.as_ref()).await?;

        let label = label_for(doctor.as_ref());
        let generated_at = now.format(GENERATED_AT_FORMAT).to_string();

        let report = format!(
            "*Appointment Summary Report*\n\
             *Doctor:* {label}\n\
             *Generated:* {generated_at}\n\
             \n\
             *Yesterday ({yesterday_date})*\n\
             - Unique patients visited: *{visits}*\n\
             \n\
             *Today ({today_date})*\n\
             - Scheduled appointments: *{today_total}*\n\
             \n\
             *Tomorrow ({tomorrow_date})*\n\
             - Scheduled appointments: *{tomorrow_total}*\n",
            yesterday_date = yesterday.date,
            visits = yesterday.unique_patients,
            today_date = today_count.date,
            today_total = today_count.count,
            tomorrow_date = tomorrow_count.date,
            tomorrow_total = tomorrow_count.count,
        );

        info!("Generated summary report for {}", label);

        Ok(SummaryReport {
            doctor: label,
            generated_at,
            report,
        })
    }

    /// Per-day appointment counts between two inclusive ISO dates.
    pub async fn appointments_between(
        &self,
        start_date: &str,
        end_date: &str,
        doctor_name: Option<&str>,
    ) -> Result<RangeReport, ReportError> {
        let start = parse_iso_date(start_date)?;
        let end = parse_iso_date(end_date)?;

        if end < start {
            return Err(ReportError::InvalidRange(format!(
                "{} is before {}",
                end_date, start_date
            )));
        }
        if (end - start).num_days() >= MAX_RANGE_DAYS {
            return Err(ReportError::InvalidRange(format!(
                "ranges are limited to {} days",
                MAX_RANGE_DAYS
            )));
        }

        let doctor = self.doctor_filter(doctor_name).await?;
        let mut daily_breakdown = Vec::new();

        for date in start.iter_days().take_while(|date| *date <= end) {
            let day = self.count_on(date, doctor.as_ref()).await?;
            daily_breakdown.push(DailyCount {
                date: day.date,
                count: day.count,
            });
        }

        Ok(RangeReport {
            start_date: iso(start),
            end_date: iso(end),
            doctor: label_for(doctor.as_ref()),
            total_appointments: daily_breakdown.iter().map(|day| day.count).sum(),
            daily_breakdown,
        })
    }

    async fn doctor_filter(&self, doctor_name: Option<&str>) -> Result<Option<Doctor>, ReportError> {
        match doctor_name.map(str::trim).filter(|name| !name.is_empty()) {
            Some(name) => Ok(Some(self.doctors.resolve_doctor(name).await?)),
            None => Ok(None),
        }
    }

    async fn count_on(&self, date: NaiveDate, doctor: Option<&Doctor>) -> Result<AppointmentCount, ReportError> {
        let appointments = self
            .store
            .scheduled_appointments_on(doctor.map(|d| d.id), date)
            .await?;

        Ok(AppointmentCount {
            date: iso(date),
            doctor: label_for(doctor),
            count: appointments.len(),
        })
    }

    async fn visits_on(&self, date: NaiveDate, doctor: Option<&Doctor>) -> Result<PatientVisits, ReportError> {
        let appointments = self
            .store
            .scheduled_appointments_on(doctor.map(|d| d.id), date)
            .await?;

        let patients: HashSet<String> = appointments
            .iter()
            .map(|apt| apt.patient_email.trim().to_lowercase())
            .collect();

        Ok(PatientVisits {
            date: iso(date),
            doctor: label_for(doctor),
            unique_patients: patients.len(),
        })
    }
}

fn iso(date: NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}

fn label_for(doctor: Option<&Doctor>) -> String {
    doctor
        .map(|d| d.name.clone())
        .unwrap_or_else(|| ALL_DOCTORS.to_string())
}
