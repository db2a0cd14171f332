//! `fds`: record store commands

use super::{parse_arg, required, Target};
use crate::console::Terminal;
use crate::dump::{write_row, DumpMode, BYTES_PER_ROW};
use crate::error::{CommandError, Reason, StoreError};
use crate::flash::FlashDriver;
use crate::shell::Command;
use crate::store::{RecordStore, MAX_RECORD_LEN};

fn store_error(e: StoreError) -> CommandError {
    log::warn!("fds: {}", e);
    CommandError::new(-5, Reason::Store(e))
}

/// Record store maintenance and inspection
pub struct Fds;

impl<F: FlashDriver, S: RecordStore> Command<Target<F, S>> for Fds {
    fn name(&self) -> &'static str {
        "fds"
    }

    fn usage(&self) -> &'static str {
        "format | info | write <id> <fill> <len> | delete <id> | dump [a]"
    }

    fn execute(
        &self,
        ctx: &mut Target<F, S>,
        args: &[&str],
        out: &mut dyn Terminal,
    ) -> Result<(), CommandError> {
        let Target { flash, store, .. } = ctx;

        match required(args, 0, -1)? {
            "format" => {
                store.format(flash).map_err(store_error)?;
                writeln!(out, "fds formatted");
            }
            "info" => {
                let status = store.status(flash).map_err(store_error)?;
                writeln!(out, "records: {}", status.records);
                writeln!(out, "entries: {}", status.entries);
                writeln!(out, "used:    {}/{} bytes", status.used, status.capacity);
                writeln!(out, "free:    {} bytes", status.free());
            }
            "write" => {
                let id: u8 = parse_arg(required(args, 1, -1)?, "id", -3)?;
                let fill: u8 = parse_arg(required(args, 2, -1)?, "fill", -3)?;
                let len: u32 = parse_arg(required(args, 3, -1)?, "len", -3)?;

                let len = len as usize;
                if len == 0 || len > store.max_record_len().min(MAX_RECORD_LEN) {
                    return Err(CommandError::new(
                        -4,
                        Reason::Store(StoreError::InvalidLength(len)),
                    ));
                }
                let data = [fill; MAX_RECORD_LEN];
                store.write(flash, id, &data[..len]).map_err(store_error)?;
            }
            "delete" => {
                let id: u8 = parse_arg(required(args, 1, -1)?, "id", -3)?;
                store.delete(flash, id).map_err(store_error)?;
            }
            "dump" => {
                let mode = match args.get(1).copied() {
                    None | Some("h") => DumpMode::Hex,
                    Some("a") => DumpMode::Ascii,
                    Some(_) => return Err(CommandError::new(-2, Reason::InvalidMode)),
                };
                let mut buf = [0u8; MAX_RECORD_LEN];
                for id in 0..store.id_count() {
                    match store.read(flash, id, &mut buf).map_err(store_error)? {
                        Some(len) => {
                            writeln!(out, "record {}: {} bytes", id, len);
                            for (row, chunk) in buf[..len].chunks(BYTES_PER_ROW).enumerate() {
                                write_row(out, (row * BYTES_PER_ROW) as u32, chunk, mode);
                            }
                        }
                        None => writeln!(out, "record {}: not found", id),
                    }
                }
            }
            _ => return Err(CommandError::new(-2, Reason::UnknownSubcommand)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::commands::tests::{run, target};
    use crate::error::{Reason, StoreError};

    #[test]
    fn test_write_builds_fill_record() {
        let mut target = target();
        let (result, _) = run(&mut target, "fds write 2 0xAB 5");
        assert_eq!(result, Ok(()));
        assert_eq!(target.store.records[&2], [0xAB; 5]);

        let (result, _) = run(&mut target, "fds write 2 1 16");
        assert_eq!(result, Ok(()));
        assert_eq!(target.store.records[&2], [1; 16]);
    }

    #[test]
    fn test_write_length_limit() {
        let mut target = target();
        let e = run(&mut target, "fds write 1 0 17").0.unwrap_err();
        assert_eq!(e.code(), -4);
        assert_eq!(e.reason(), Reason::Store(StoreError::InvalidLength(17)));
        assert_eq!(run(&mut target, "fds write 1 0 0").0.unwrap_err().code(), -4);
        assert!(target.store.records.is_empty());
    }

    #[test]
    fn test_argument_errors() {
        let mut target = target();
        assert_eq!(run(&mut target, "fds").0.unwrap_err().code(), -1);
        assert_eq!(run(&mut target, "fds write 1 2").0.unwrap_err().code(), -1);
        assert_eq!(run(&mut target, "fds delete").0.unwrap_err().code(), -1);
        let e = run(&mut target, "fds gc").0.unwrap_err();
        assert_eq!(e.code(), -2);
        assert_eq!(e.reason(), Reason::UnknownSubcommand);
        assert_eq!(run(&mut target, "fds dump x").0.unwrap_err().code(), -2);
        assert_eq!(run(&mut target, "fds write 256 0 1").0.unwrap_err().code(), -3);
        assert_eq!(run(&mut target, "fds delete one").0.unwrap_err().code(), -3);
    }

    #[test]
    fn test_store_errors() {
        let mut target = target();
        let e = run(&mut target, "fds write 4 0 1").0.unwrap_err();
        assert_eq!(e.code(), -5);
        assert_eq!(e.reason(), Reason::Store(StoreError::InvalidId(4)));

        let e = run(&mut target, "fds delete 3").0.unwrap_err();
        assert_eq!(e.reason(), Reason::Store(StoreError::NotFound(3)));
    }

    #[test]
    fn test_delete_and_format() {
        let mut target = target();
        run(&mut target, "fds write 0 7 2");
        run(&mut target, "fds write 1 7 2");
        assert_eq!(run(&mut target, "fds delete 0").0, Ok(()));
        assert!(!target.store.records.contains_key(&0));
        assert!(target.store.records.contains_key(&1));

        let (result, text) = run(&mut target, "fds format");
        assert_eq!(result, Ok(()));
        assert_eq!(text, "fds formatted\n");
        assert_eq!(target.store.formats, 1);
        assert!(target.store.records.is_empty());
    }

    #[test]
    fn test_info() {
        let mut target = target();
        run(&mut target, "fds write 0 7 10");
        let (result, text) = run(&mut target, "fds info");
        assert_eq!(result, Ok(()));
        assert_eq!(
            text,
            "records: 1\nentries: 1\nused:    10/256 bytes\nfree:    246 bytes\n"
        );
    }

    #[test]
    fn test_dump_scans_every_id() {
        let mut target = target();
        run(&mut target, "fds write 1 0x41 3");
        run(&mut target, "fds write 3 0xEE 16");

        let (result, text) = run(&mut target, "fds dump");
        assert_eq!(result, Ok(()));
        assert_eq!(
            text,
            "record 0: not found\n\
             record 1: 3 bytes\n\
             0x00000000: 41 41 41\n\
             record 2: not found\n\
             record 3: 16 bytes\n\
             0x00000000: ee ee ee ee ee ee ee ee ee ee ee ee ee ee ee ee\n"
        );

        let (_, text) = run(&mut target, "fds dump a");
        assert!(text.contains("record 1: 3 bytes\n0x00000000: AAA\n"));
    }
}
