use std::time::Duration;
use stowage::{Arena, BufferStream, HeapAllocator, PollEvent, Stream, StreamError, Whence};

/// Reads newline-terminated lines from any stream, the way a stream consumer
/// that knows nothing about the concrete type would.
fn read_lines(stream: &mut dyn Stream) -> Result<Vec<String>, StreamError> {
    let mut lines = Vec::new();
    let mut line = Vec::new();

    loop {
        match stream.read_byte() {
            Ok(b'\n') => lines.push(String::from_utf8_lossy(&std::mem::take(&mut line)).into()),
            Ok(byte) => line.push(byte),
            Err(StreamError::EndOfStream) => break,
            Err(err) => return Err(err),
        }
    }

    if !line.is_empty() {
        lines.push(String::from_utf8_lossy(&line).into());
    }

    Ok(lines)
}

#[test]
fn hello_round_trip() {
    let mut stream = BufferStream::new();

    stream.write(b"hello").unwrap();
    stream.seek(0, Whence::Start).unwrap();

    let mut out = [0; 5];
    assert_eq!(stream.read(&mut out), Ok(5));
    assert_eq!(&out, b"hello");
}

#[test]
fn fixed_four_bytes_rejects_five() {
    let mut memory = *b"wxyz";
    let mut stream = BufferStream::fixed(&mut memory);

    assert_eq!(stream.write(b"12345"), Err(StreamError::EndOfStream));
    assert_eq!(stream.as_bytes(), b"wxyz");
    assert_eq!(stream.tell(), Ok(0));
}

#[test]
fn consumers_treat_every_kind_alike() {
    let text = b"first\nsecond\nthird";

    let mut read_only = BufferStream::read_only(text);
    let mut memory = *text;
    let mut fixed = BufferStream::fixed(&mut memory);
    let mut growable = BufferStream::copied_in(text, HeapAllocator).unwrap();

    for stream in [&mut read_only as &mut dyn Stream, &mut fixed, &mut growable] {
        assert_eq!(read_lines(stream).unwrap(), ["first", "second", "third"]);
    }
}

#[test]
fn growable_stream_in_an_arena() {
    let arena = Arena::new(HeapAllocator, 64).unwrap();
    let mut stream = BufferStream::new_in(&arena);

    for i in 0..100u8 {
        stream.write_byte(i).unwrap();
    }

    assert_eq!(stream.size(), Ok(100));
    assert_eq!(stream.seek(10, Whence::End), Ok(90));
    assert_eq!(stream.read_byte(), Ok(90));

    let mut tail = [0; 16];
    assert_eq!(stream.read(&mut tail), Ok(9));
    assert_eq!(tail[8], 99);
}

#[test]
fn flush_then_reuse() {
    let mut stream = BufferStream::with_capacity_in(32, HeapAllocator).unwrap();

    stream.write(b"frame one").unwrap();
    stream.flush().unwrap();
    stream.write(b"two").unwrap();

    assert_eq!(stream.as_bytes(), b"two");
    assert_eq!(stream.capacity(), 32);
}

#[test]
fn poll_never_blocks() {
    let mut read_only = BufferStream::read_only(b"");
    let mut growable = BufferStream::new();
    let timeout = Duration::from_secs(60);

    assert_eq!(read_only.poll(PollEvent::Read, timeout), Ok(true));
    assert_eq!(read_only.poll(PollEvent::Write, timeout), Ok(false));
    assert_eq!(growable.poll(PollEvent::Write, timeout), Ok(true));
}
