/// Number of work-groups covering `size` items per axis, rounding up.
pub fn compute_work_group_count(
    (width, height): (u32, u32),
    (workgroup_width, workgroup_height): (u32, u32),
) -> (u32, u32) {
    let x = width.div_ceil(workgroup_width);
    let y = height.div_ceil(workgroup_height);

    (x, y)
}

/// Device allocation size for `len` logical bytes. wgpu copies and
/// mapped ranges work in 4-byte units.
pub fn padded_buffer_size(len: usize) -> u64 {
    let align = wgpu::COPY_BUFFER_ALIGNMENT;
    let len = len as u64;
    (len + align - 1) / align * align
}
