use std::fs::File;
use std::io::Error;
use std::path::Path;

pub const HEADER: [&str; 7] = [
    "project",
    "payment",
    "timestamp",
    "type",
    "state",
    "reference",
    "data",
];

/// Writes `payments` complete create → execute sequences, one payment each.
pub fn generate_csv(path: &Path, payments: u64) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record(HEADER)?;

    for payment in 1..=payments {
        let id = payment.to_string();
        let reference = format!("PAY-{payment}");
        let steps = [
            ("create_payment", "", ""),
            ("create_payment_response", "created", reference.as_str()),
            ("execute_payment", "", reference.as_str()),
            ("execute_payment_response", "approved", reference.as_str()),
        ];
        for (second, (ty, state, reference)) in steps.into_iter().enumerate() {
            let timestamp = format!("2024-05-01T12:00:0{second}Z");
            wtr.write_record(["1", id.as_str(), timestamp.as_str(), ty, state, reference, ""])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
