//! Backend status codes and their descriptions.
//!
//! Every accelerator failure is classified into one of these codes so the
//! report always carries a number and a short description, whatever the
//! underlying wgpu error looked like.

pub const SUCCESS: i32 = 0;

// run-time errors
pub const DEVICE_NOT_FOUND: i32 = -1;
pub const DEVICE_NOT_AVAILABLE: i32 = -2;
pub const COMPILER_NOT_AVAILABLE: i32 = -3;
pub const MEM_OBJECT_ALLOCATION_FAILURE: i32 = -4;
pub const OUT_OF_RESOURCES: i32 = -5;
pub const OUT_OF_HOST_MEMORY: i32 = -6;
pub const PROFILING_INFO_NOT_AVAILABLE: i32 = -7;
pub const MEM_COPY_OVERLAP: i32 = -8;
pub const IMAGE_FORMAT_MISMATCH: i32 = -9;
pub const IMAGE_FORMAT_NOT_SUPPORTED: i32 = -10;
pub const BUILD_PROGRAM_FAILURE: i32 = -11;
pub const MAP_FAILURE: i32 = -12;
pub const MISALIGNED_SUB_BUFFER_OFFSET: i32 = -13;
pub const EXEC_STATUS_ERROR_FOR_EVENTS_IN_WAIT_LIST: i32 = -14;
pub const COMPILE_PROGRAM_FAILURE: i32 = -15;
pub const LINKER_NOT_AVAILABLE: i32 = -16;
pub const LINK_PROGRAM_FAILURE: i32 = -17;
pub const DEVICE_PARTITION_FAILED: i32 = -18;
pub const KERNEL_ARG_INFO_NOT_AVAILABLE: i32 = -19;

// compile-time errors
pub const INVALID_VALUE: i32 = -30;
pub const INVALID_DEVICE_TYPE: i32 = -31;
pub const INVALID_PLATFORM: i32 = -32;
pub const INVALID_DEVICE: i32 = -33;
pub const INVALID_CONTEXT: i32 = -34;
pub const INVALID_QUEUE_PROPERTIES: i32 = -35;
pub const INVALID_COMMAND_QUEUE: i32 = -36;
pub const INVALID_HOST_PTR: i32 = -37;
pub const INVALID_MEM_OBJECT: i32 = -38;
pub const INVALID_IMAGE_FORMAT_DESCRIPTOR: i32 = -39;
pub const INVALID_IMAGE_SIZE: i32 = -40;
pub const INVALID_SAMPLER: i32 = -41;
pub const INVALID_BINARY: i32 = -42;
pub const INVALID_BUILD_OPTIONS: i32 = -43;
pub const INVALID_PROGRAM: i32 = -44;
pub const INVALID_PROGRAM_EXECUTABLE: i32 = -45;
pub const INVALID_KERNEL_NAME: i32 = -46;
pub const INVALID_KERNEL_DEFINITION: i32 = -47;
pub const INVALID_KERNEL: i32 = -48;
pub const INVALID_ARG_INDEX: i32 = -49;
pub const INVALID_ARG_VALUE: i32 = -50;
pub const INVALID_ARG_SIZE: i32 = -51;
pub const INVALID_KERNEL_ARGS: i32 = -52;
pub const INVALID_WORK_DIMENSION: i32 = -53;
pub const INVALID_WORK_GROUP_SIZE: i32 = -54;
pub const INVALID_WORK_ITEM_SIZE: i32 = -55;
pub const INVALID_GLOBAL_OFFSET: i32 = -56;
pub const INVALID_EVENT_WAIT_LIST: i32 = -57;
pub const INVALID_EVENT: i32 = -58;
pub const INVALID_OPERATION: i32 = -59;
pub const INVALID_GL_OBJECT: i32 = -60;
pub const INVALID_BUFFER_SIZE: i32 = -61;
pub const INVALID_MIP_LEVEL: i32 = -62;
pub const INVALID_GLOBAL_WORK_SIZE: i32 = -63;
pub const INVALID_PROPERTY: i32 = -64;
pub const INVALID_IMAGE_DESCRIPTOR: i32 = -65;
pub const INVALID_COMPILER_OPTIONS: i32 = -66;
pub const INVALID_LINKER_OPTIONS: i32 = -67;
pub const INVALID_DEVICE_PARTITION_COUNT: i32 = -68;

/// Terminates [`TABLE`]. Lies below every valid code.
pub const TABLE_END: i32 = -2000;

/// Returned by [`describe_or_default`] for codes missing from the table.
pub const NO_DESCRIPTION: &str = "no description";

struct StatusEntry {
    code: i32,
    desc: &'static str,
}

const fn entry(code: i32, desc: &'static str) -> StatusEntry {
    StatusEntry { code, desc }
}

static TABLE: &[StatusEntry] = &[
    entry(SUCCESS, "success"),
    entry(DEVICE_NOT_FOUND, "device not found"),
    entry(DEVICE_NOT_AVAILABLE, "device not available"),
    entry(COMPILER_NOT_AVAILABLE, "compiler not available"),
    entry(MEM_OBJECT_ALLOCATION_FAILURE, "mem object allocation failure"),
    entry(OUT_OF_RESOURCES, "out of resources"),
    entry(OUT_OF_HOST_MEMORY, "out of host memory"),
    entry(PROFILING_INFO_NOT_AVAILABLE, "profiling info not available"),
    entry(MEM_COPY_OVERLAP, "mem copy overlap"),
    entry(IMAGE_FORMAT_MISMATCH, "image format mismatch"),
    entry(IMAGE_FORMAT_NOT_SUPPORTED, "image format not supported"),
    entry(BUILD_PROGRAM_FAILURE, "build program failure"),
    entry(MAP_FAILURE, "map failure"),
    entry(MISALIGNED_SUB_BUFFER_OFFSET, "misaligned sub buffer offset"),
    entry(
        EXEC_STATUS_ERROR_FOR_EVENTS_IN_WAIT_LIST,
        "exec status error for events in wait list",
    ),
    entry(COMPILE_PROGRAM_FAILURE, "compile program failure"),
    entry(LINKER_NOT_AVAILABLE, "linker not available"),
    entry(LINK_PROGRAM_FAILURE, "link program failure"),
    entry(DEVICE_PARTITION_FAILED, "device partition failed"),
    entry(KERNEL_ARG_INFO_NOT_AVAILABLE, "kernel arg info not available"),
    entry(INVALID_VALUE, "invalid value"),
    entry(INVALID_DEVICE_TYPE, "invalid device type"),
    entry(INVALID_PLATFORM, "invalid platform"),
    entry(INVALID_DEVICE, "invalid device"),
    entry(INVALID_CONTEXT, "invalid context"),
    entry(INVALID_QUEUE_PROPERTIES, "invalid queue properties"),
    entry(INVALID_COMMAND_QUEUE, "invalid command queue"),
    entry(INVALID_HOST_PTR, "invalid host pointer"),
    entry(INVALID_MEM_OBJECT, "invalid mem object"),
    entry(
        INVALID_IMAGE_FORMAT_DESCRIPTOR,
        "invalid image format descriptor",
    ),
    entry(INVALID_IMAGE_SIZE, "invalid image size"),
    entry(INVALID_SAMPLER, "invalid sampler"),
    entry(INVALID_BINARY, "invalid binary"),
    entry(INVALID_BUILD_OPTIONS, "invalid build options"),
    entry(INVALID_PROGRAM, "invalid program"),
    entry(INVALID_PROGRAM_EXECUTABLE, "invalid program executable"),
    entry(INVALID_KERNEL_NAME, "invalid kernel name"),
    entry(INVALID_KERNEL_DEFINITION, "invalid kernel definition"),
    entry(INVALID_KERNEL, "invalid kernel"),
    entry(INVALID_ARG_INDEX, "invalid arg index"),
    entry(INVALID_ARG_VALUE, "invalid arg value"),
    entry(INVALID_ARG_SIZE, "invalid arg size"),
    entry(INVALID_KERNEL_ARGS, "invalid kernel args"),
    entry(INVALID_WORK_DIMENSION, "invalid work dimension"),
    entry(INVALID_WORK_GROUP_SIZE, "invalid work group size"),
    entry(INVALID_WORK_ITEM_SIZE, "invalid work item size"),
    entry(INVALID_GLOBAL_OFFSET, "invalid global offset"),
    entry(INVALID_EVENT_WAIT_LIST, "invalid event wait list"),
    entry(INVALID_EVENT, "invalid event"),
    entry(INVALID_OPERATION, "invalid operation"),
    entry(INVALID_GL_OBJECT, "invalid gl object"),
    entry(INVALID_BUFFER_SIZE, "invalid buffer size"),
    entry(INVALID_MIP_LEVEL, "invalid mip level"),
    entry(INVALID_GLOBAL_WORK_SIZE, "invalid global work size"),
    entry(INVALID_PROPERTY, "invalid property"),
    entry(INVALID_IMAGE_DESCRIPTOR, "invalid image descriptor"),
    entry(INVALID_COMPILER_OPTIONS, "invalid compiler options"),
    entry(INVALID_LINKER_OPTIONS, "invalid linker options"),
    entry(INVALID_DEVICE_PARTITION_COUNT, "invalid device partition count"),
    entry(TABLE_END, ""),
];

/// Looks up the description of a status code.
///
/// Returns `None` for codes outside the table, including [`TABLE_END`].
pub fn describe(code: i32) -> Option<&'static str> {
    TABLE
        .iter()
        .take_while(|e| e.code != TABLE_END)
        .find(|e| e.code == code)
        .map(|e| e.desc)
}

pub fn describe_or_default(code: i32) -> &'static str {
    describe(code).unwrap_or(NO_DESCRIPTION)
}
