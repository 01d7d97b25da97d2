use std::io;

use super::label_queue::LabelEntry;
use super::leg::CandidateLeg;
use super::path::Path;
use super::StopId;


/// Receives the events of a traced search.  Every method does nothing by default.
pub trait TraceSink {
    fn label_popped(&mut self, _label_iteration: u32, _entry: &LabelEntry) {}

    fn leg_added(&mut self, _label_iteration: u32, _stop_id: StopId, _leg: &CandidateLeg,
                 _label_changed: bool) {}

    fn path_found(&mut self, _path: &Path, _probability: f64) {}
}

pub struct NoTrace;

impl TraceSink for NoTrace {}


/// Writes trace events to the `log` facade at debug level.
pub struct LogTrace {
    person_id: String,
}

impl LogTrace {
    pub fn new(person_id: &str) -> LogTrace {
        return LogTrace {
            person_id: person_id.to_string(),
        };
    }
}

impl TraceSink for LogTrace {
    fn label_popped(&mut self, label_iteration: u32, entry: &LabelEntry) {
        log::debug!("[{}] iteration {}: pop stop {} {} label {:.4}", self.person_id,
                    label_iteration, entry.stop_id,
                    if entry.is_trip { "trip" } else { "non-trip" }, entry.label);
    }

    fn leg_added(&mut self, label_iteration: u32, stop_id: StopId, leg: &CandidateLeg,
                 label_changed: bool) {
        log::debug!("[{}] iteration {}: stop {} {} {} via {} at {:.2} cost {:.4}{}",
                    self.person_id, label_iteration, stop_id, leg.mode, leg.trip_id,
                    leg.succpred, leg.deparr_time, leg.cost,
                    if label_changed { " (label changed)" } else { "" });
    }

    fn path_found(&mut self, path: &Path, probability: f64) {
        log::debug!("[{}] path {} probability {:.4}", self.person_id, path, probability);
    }
}


/// Writes one csv row per leg offered to a hyperlink.
pub struct CsvLabelTrace<W: io::Write> {
    writer: csv::Writer<W>,
    error: Option<csv::Error>,
}

impl<W: io::Write> CsvLabelTrace<W> {
    pub fn new(writer: W) -> CsvLabelTrace<W> {
        let mut trace = CsvLabelTrace {
            writer: csv::Writer::from_writer(writer),
            error: None,
        };
        let header = ["label_iteration", "stop_id", "mode", "trip_id", "succpred",
                      "deparr_time", "arrdep_time", "link_time", "link_cost", "cost",
                      "label_changed"];
        if let Err(err) = trace.writer.write_record(&header) {
            trace.error = Some(err);
        }
        return trace;
    }

    /// Flushes the rows and hands back the writer, or the first error encountered.
    pub fn finish(self) -> Result<W, csv::Error> {
        if let Some(err) = self.error {
            return Err(err);
        }
        return self.writer.into_inner().map_err(|err| err.into_error().into());
    }
}

impl<W: io::Write> TraceSink for CsvLabelTrace<W> {
    fn leg_added(&mut self, label_iteration: u32, stop_id: StopId, leg: &CandidateLeg,
                 label_changed: bool) {
        if self.error.is_some() {
            return;
        }
        let record = [
            label_iteration.to_string(),
            stop_id.to_string(),
            leg.mode.to_string(),
            leg.trip_id.to_string(),
            leg.succpred.to_string(),
            format!("{:.4}", leg.deparr_time),
            format!("{:.4}", leg.arrdep_time),
            format!("{:.4}", leg.link_time),
            format!("{:.4}", leg.link_cost),
            format!("{:.4}", leg.cost),
            (label_changed as u8).to_string(),
        ];
        if let Err(err) = self.writer.write_record(&record) {
            log::warn!("label trace stopped: {}", err);
            self.error = Some(err);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::leg::LegMode;
    use crate::test_utils::walk_leg;

    #[test]
    fn test_csv_label_trace() {
        let mut trace = CsvLabelTrace::new(vec![]);
        trace.leg_added(3, 20, &walk_leg(LegMode::Egress, 2, 120., 125., 5.), true);
        trace.leg_added(4, 10, &walk_leg(LegMode::Transfer, 20, 95., 100., 9.5), false);
        // popped labels are not part of this trace
        trace.label_popped(4, &LabelEntry { label: 5., stop_id: 20, is_trip: false });
        let bytes = trace.finish().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("label_iteration,stop_id,mode"));
        assert_eq!(lines[1],
                   "3,20,egress,1,2,120.0000,125.0000,5.0000,5.0000,5.0000,1");
        assert_eq!(lines[2],
                   "4,10,transfer,1,20,95.0000,100.0000,5.0000,9.5000,9.5000,0");
    }

    #[test]
    fn test_log_trace_does_not_panic() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut trace = LogTrace::new("person-1");
        trace.label_popped(1, &LabelEntry { label: 5., stop_id: 20, is_trip: true });
        trace.leg_added(1, 20, &walk_leg(LegMode::Egress, 2, 120., 125., 5.), true);
        trace.path_found(&Path::new(true), 1.);
        NoTrace.label_popped(1, &LabelEntry { label: 5., stop_id: 20, is_trip: true });
    }
}
