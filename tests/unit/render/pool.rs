use super::*;

fn res() -> Resolution {
    Resolution {
        width: 8,
        height: 4,
    }
}

#[test]
fn checkout_reuses_preallocated_buffers() {
    let mut pool = FrameBufferPool::new(res(), 2).unwrap();
    let a = pool.checkout(PixelFormat::Rgb8).unwrap();
    let b = pool.checkout(PixelFormat::Rgb8).unwrap();
    let st = pool.stats();
    assert_eq!(st.reused_frames, 2);
    assert_eq!(st.checked_out, 2);
    assert_eq!(st.retained, 0);
    pool.release(a);
    pool.release(b);
    assert_eq!(pool.stats().retained, 2);
}

#[test]
fn released_buffers_are_zero_filled() {
    let mut pool = FrameBufferPool::new(res(), 1).unwrap();
    let mut f = pool.checkout(PixelFormat::Rgb8).unwrap();
    f.data.fill(77);
    pool.release(f);
    let again = pool.checkout(PixelFormat::Rgb8).unwrap();
    assert!(again.data.iter().all(|&b| b == 0));
}

#[test]
fn pool_honors_capacity() {
    let mut pool = FrameBufferPool::new(res(), 1).unwrap();
    let a = pool.checkout(PixelFormat::Rgb8).unwrap();
    let b = pool.checkout(PixelFormat::Rgb8).unwrap();
    assert_eq!(pool.stats().alloc_frames, 2);
    pool.release(a);
    pool.release(b);
    let st = pool.stats();
    assert_eq!(st.retained, 1);
    assert_eq!(st.dropped_on_release, 1);
}

#[test]
fn foreign_sized_buffers_are_dropped() {
    let mut pool = FrameBufferPool::new(res(), 4).unwrap();
    let _ = pool.checkout(PixelFormat::Rgba8).unwrap();
    pool.release(Frame::new(3, 3, PixelFormat::Rgba8));
    assert_eq!(pool.stats().dropped_on_release, 1);
}

#[test]
fn zero_resolution_is_an_allocation_error() {
    let err = FrameBufferPool::new(
        Resolution {
            width: 0,
            height: 4,
        },
        1,
    )
    .unwrap_err();
    assert!(matches!(err, CadenceError::Allocation(_)));
}
