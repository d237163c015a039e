/// BMP 文件的标准头部大小 (字节)。
/// 隐写操作将跳过这个头部，从像素数据开始。
pub const BMP_HEADER_SIZE: usize = 54;

/// 头部中图像宽度 (32 位小端整数) 的偏移量。
pub const WIDTH_OFFSET: usize = 18;

/// 头部中图像高度 (32 位小端整数) 的偏移量。
pub const HEIGHT_OFFSET: usize = 22;

/// 每个像素占用的字节数 (24 位 BMP: B, G, R)。
pub const BYTES_PER_PIXEL: u64 = 3;

/// 写在容器最前面的标记，解码时用来确认图像确实包含隐藏数据。
pub const MAGIC_MARKER: &[u8] = b"#*";

/// 隐藏一个字节所需的载体字节数。
/// 每个载体字节只存储 1 bit，因此需要 8 个。
pub const BYTE_SPAN: usize = 8;

/// 隐藏一个 `u32` 长度字段所需的载体字节数。
pub const U32_SPAN: usize = 32;

/// 解码时接受的扩展名最大长度 (字节)。
/// 在分配缓冲区之前检查，防止损坏的长度字段导致巨大的分配。
pub const MAX_EXTENSION_LEN: u32 = 64;

/// 解码时接受的负载最大长度 (字节)，载体大小未知时同样生效。
pub const MAX_PAYLOAD_LEN: u32 = 64 * 1024 * 1024;

/// 载体图像和输出图像允许的扩展名。
pub const IMAGE_EXTENSIONS: &[&str] = &[".bmp"];

/// 可以被隐藏的秘密文件扩展名。
pub const SECRET_EXTENSIONS: &[&str] = &[".txt", ".c", ".h", ".sh"];

/// 编码时未指定输出路径时使用的文件名。
pub const DEFAULT_STEGO_NAME: &str = "destination.bmp";

/// 解码时未指定输出名称时使用的基础文件名 (扩展名来自解码结果)。
pub const DEFAULT_SECRET_BASE: &str = "decoded";
