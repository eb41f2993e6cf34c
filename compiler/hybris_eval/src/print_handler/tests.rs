use super::*;

#[test]
fn buffer_handler_println_captures_with_newline() {
    let handler = BufferPrintHandler::new();
    handler.println("hello");
    assert_eq!(handler.get_output(), "hello\n");
}

#[test]
fn buffer_handler_mixes_print_and_println() {
    let handler = BufferPrintHandler::new();
    handler.print("hello");
    handler.print(" ");
    handler.println("world");
    assert_eq!(handler.get_output(), "hello world\n");
}

#[test]
fn buffer_handler_clear_empties_buffer() {
    let handler = buffer_handler();
    handler.println("hello");
    handler.clear();
    assert!(handler.get_output().is_empty());
}

#[test]
fn silent_handler_discards_output() {
    let handler = silent_handler();
    handler.println("hello");
    handler.print("world");
    assert_eq!(handler.get_output(), "");
}

#[test]
fn buffer_handler_is_shared_across_threads() {
    let handler = buffer_handler();
    let workers: Vec<_> = (0..4)
        .map(|_| {
            let handler = handler.clone();
            std::thread::spawn(move || {
                for _ in 0..25 {
                    handler.println("x");
                }
            })
        })
        .collect();
    for worker in workers {
        let _ = worker.join();
    }
    assert_eq!(handler.get_output().lines().count(), 100);
}
