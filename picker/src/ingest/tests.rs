use super::*;
use std::time::Duration;

fn spec(program: &str, args: &[&str]) -> CommandSpec {
    CommandSpec::new(program, args.iter().map(|a| a.to_string()).collect()).unwrap()
}

/// Polls until a completion arrives or the deadline passes.
fn wait_for_completion(ingestor: &mut Ingestor) -> Completion {
    for _ in 0..500 {
        if let Some(completion) = ingestor.poll() {
            return completion;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    panic!("command never completed");
}

mod split {
    use super::*;

    #[test]
    fn test_trailing_empty_lines_trimmed() {
        let items = split_lines("a\nb\n\n\n");
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].display(), "b");
    }

    #[test]
    fn test_interior_empty_lines_kept() {
        let items = split_lines("a\n\nb\n");
        assert_eq!(items.len(), 3);
        assert_eq!(items[1].display(), "");
    }

    #[test]
    fn test_crlf_stripped() {
        let items = split_lines("a\r\nb\r\n");
        assert_eq!(items[0].display(), "a");
        assert_eq!(items[1].display(), "b");
    }

    #[test]
    fn test_empty_output_is_empty_list() {
        assert!(split_lines("").is_empty());
    }
}

mod resolve {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_unknown_program_is_config_error() {
        let err = Ingestor::new(spec("definitely-not-a-real-binary-name", &[])).err();
        assert!(matches!(err, Some(ConfigError::ExecutableNotFound(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_program_found_on_path() {
        assert!(Ingestor::new(spec("sh", &[])).is_ok());
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("tool");
        let err = Ingestor::new(spec(missing.to_str().unwrap(), &[])).err();
        assert!(matches!(err, Some(ConfigError::ExecutableNotFound(_))));

        let mut file = std::fs::File::create(&missing).unwrap();
        file.write_all(b"#!/bin/sh\n").unwrap();
        drop(file);
        assert!(Ingestor::new(spec(missing.to_str().unwrap(), &[])).is_ok());
    }
}

#[cfg(unix)]
mod run {
    use super::*;

    #[test]
    fn test_stdout_lines_become_items() {
        let mut ingestor = Ingestor::new(spec("sh", &["-c", "printf 'one\\ntwo\\n'"])).unwrap();
        ingestor.spawn("");

        let completion = wait_for_completion(&mut ingestor);
        assert_eq!(completion.generation, ingestor.generation());

        let items = completion.result.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].display(), "one");
        assert!(!ingestor.is_pending());
    }

    #[test]
    fn test_nonzero_exit_degrades_to_error() {
        let mut ingestor = Ingestor::new(spec("sh", &["-c", "printf 'x\\n'; exit 3"])).unwrap();
        ingestor.spawn("");

        let completion = wait_for_completion(&mut ingestor);
        assert!(completion.result.is_err());
    }

    #[test]
    fn test_respawn_supersedes_previous_generation() {
        let mut ingestor =
            Ingestor::new(spec("sh", &["-c", "sleep 0.2; printf 'line\\n'"])).unwrap();
        ingestor.spawn("");
        let first = ingestor.generation();

        // Respawn before the first child finishes: it is killed, and any
        // completion it still produces carries a stale generation.
        ingestor.spawn("");
        assert_eq!(ingestor.generation(), first + 1);

        let mut completion = wait_for_completion(&mut ingestor);
        while completion.generation != ingestor.generation() {
            completion = wait_for_completion(&mut ingestor);
        }
        assert_eq!(completion.generation, first + 1);
        assert_eq!(completion.result.unwrap().len(), 1);
    }

    #[test]
    fn test_late_stale_completion_does_not_mask_fresh_run() {
        // The slow run backgrounds a grandchild that inherits the stdout
        // pipe, so its completion outlives the kill and lands in the
        // channel after the fresh run's.
        let script = r#"case "$1" in slow) sleep 0.4 & ;; esac; printf '%s\n' "$1""#;
        let mut ingestor = Ingestor::new(spec("sh", &["-c", script, "sh", "{q}"])).unwrap();

        ingestor.spawn("slow");
        std::thread::sleep(Duration::from_millis(50));
        ingestor.spawn("fast");
        let fresh = ingestor.generation();

        // Wait until both completions are queued: the fresh one first,
        // the superseded one once the grandchild releases the pipe.
        std::thread::sleep(Duration::from_millis(700));

        let completion = wait_for_completion(&mut ingestor);
        assert_eq!(completion.generation, fresh);
        assert_eq!(completion.result.unwrap()[0].display(), "fast");
        assert!(!ingestor.is_pending());
    }

    #[test]
    fn test_query_placeholder_substituted() {
        let mut ingestor = Ingestor::new(spec("sh", &["-c", "printf '%s\\n' {q}"])).unwrap();
        assert!(ingestor.is_live());
        ingestor.spawn("needle");

        let items = wait_for_completion(&mut ingestor).result.unwrap();
        assert_eq!(items[0].display(), "needle");
    }
}
