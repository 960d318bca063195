use loupe::{
  layout::{FixedLayout, U16, U32},
  ByteBuf, ViewErr,
};

/// The sample record used throughout: 8 bytes, little-endian, C field
/// order, with its one padding byte spelled out.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(C)]
struct Record {
  id:        U32,
  value:     U16,
  is_active: u8,
  padding:   u8,
}

// SAFETY: Every field is itself `FixedLayout`, the field order is `repr(C)`,
// and the padding byte is an explicit field, so the 8-byte layout is fully
// determined and every bit pattern is valid.
unsafe impl FixedLayout for Record {}

fn sample() -> Record {
  Record {
    id:        1.into(),
    value:     2.into(),
    is_active: 1,
    padding:   0,
  }
}

#[test]
fn record_round_trips_through_bytes() {
  let record = sample();

  let bytes = record.as_bytes();
  assert_eq!(bytes.len(), 8);
  assert_eq!(bytes, &[1, 0, 0, 0, 2, 0, 1, 0]);
  // The byte view is the record itself, not a copy.
  assert_eq!(bytes.as_ptr() as usize, &record as *const Record as usize);

  let restored = Record::from_bytes(bytes).unwrap();
  assert_eq!(*restored, record);
}

#[test]
fn short_buffer_is_a_reported_failure() {
  let bytes = [1u8, 0, 0, 0, 2, 0, 1]; // one byte short

  assert_eq!(
    Record::from_bytes(&bytes[..]),
    Err(ViewErr::SizeMismatch {
      expected: 8,
      observed: 7
    })
  );
  assert_eq!(
    Record::from_bytes(&[]),
    Err(ViewErr::SizeMismatch {
      expected: 8,
      observed: 0
    })
  );
}

#[test]
fn oversized_buffer_is_rejected_too() {
  let bytes = [0u8; 9];
  assert!(Record::from_bytes(&bytes[..]).is_err());
}

#[test]
fn records_stream_through_a_buffer() {
  let mut buf = ByteBuf::zeroed(24).unwrap();

  let cursor = &mut 0;
  for n in 0..3u32 {
    let record = Record {
      id:        n.into(),
      value:     ((n * 10) as u16).into(),
      is_active: (n % 2) as u8,
      padding:   0,
    };
    record.write(&mut buf, cursor).unwrap();
  }
  assert_eq!(*cursor, 24);

  let cursor = &mut 0;
  let viewed = Record::view_slice(&buf, cursor, 3).unwrap();
  assert_eq!(viewed[1].id.get(), 1);
  assert_eq!(viewed[2].value.get(), 20);
  assert_eq!(viewed.as_ptr() as usize, buf.as_slice().as_ptr() as usize);

  // A fourth record is not there to view.
  assert!(Record::view(&buf, cursor).is_err());
}

#[test]
fn writes_through_an_in_place_view() {
  let mut buf = ByteBuf::zeroed(8).unwrap();

  {
    let record = Record::from_bytes_mut(buf.as_mut_slice()).unwrap();
    record.id = 7.into();
    record.is_active = 1;
  }
  assert_eq!(buf.as_slice(), &[7, 0, 0, 0, 0, 0, 1, 0]);
}

/// A four-byte field with a four-byte alignment requirement, for exercising
/// the alignment half of the reinterpretation contract.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(C, align(4))]
struct Counter {
  ticks: [u8; 4],
}

// SAFETY: One fixed-size byte array, `repr(C)`, any bit pattern valid.  The
// declared alignment only constrains where it may be viewed.
unsafe impl FixedLayout for Counter {}

#[test]
fn misaligned_views_are_refused() {
  // `ByteBuf` storage always starts on an 8-byte boundary.
  let buf = ByteBuf::from_slice(&[0xAA; 12]).unwrap();
  let base = buf.as_slice().as_ptr() as usize;

  assert!(Counter::from_bytes(&buf.as_slice()[0..4]).is_ok());
  assert!(Counter::from_bytes(&buf.as_slice()[8..12]).is_ok());
  assert_eq!(
    Counter::from_bytes(&buf.as_slice()[1..5]),
    Err(ViewErr::Unaligned {
      needed: 4,
      addr:   base + 1
    })
  );

  let cursor = &mut 2;
  assert!(Counter::view(&buf, cursor).is_err());
}
