use image::{ImageBuffer, Rgb, RgbImage};
use lsb_stego::{
    cli::{DecodeArgs, EncodeArgs},
    handler::{handle_decode, handle_encode},
};
use rand::RngCore;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const HEADER: usize = 54;

/// 一个辅助函数，用于创建一个带有随机像素的 24 位 BMP 测试图像
fn create_test_image(path: &Path, width: u32, height: u32) {
    let mut raw_pixels = vec![0u8; (width * height * 3) as usize];
    rand::rng().fill_bytes(&mut raw_pixels);

    let img_buf: RgbImage =
        ImageBuffer::from_raw(width, height, raw_pixels).expect("Pixel buffer has the wrong size.");
    img_buf.save(path).expect("Failed to create test image.");
}

/// 创建一个所有像素最低位都为 0 的图像，保证其中不可能出现标记
fn create_flat_image(path: &Path, width: u32, height: u32) {
    let img_buf: RgbImage = ImageBuffer::from_pixel(width, height, Rgb([128, 64, 200]));
    img_buf.save(path).expect("Failed to create test image.");
}

fn encode_args(image: &Path, secret: &Path, dest: Option<PathBuf>) -> EncodeArgs {
    EncodeArgs {
        image: image.to_path_buf(),
        secret: secret.to_path_buf(),
        dest,
        force: false,
    }
}

fn decode_args(image: &Path, output: Option<PathBuf>) -> DecodeArgs {
    DecodeArgs {
        image: image.to_path_buf(),
        output,
        force: false,
    }
}

/// 验证从隐藏到恢复的完整流程
#[test]
fn test_handle_encode_and_decode_integration() -> anyhow::Result<()> {
    // 1. 准备环境
    let dir = tempdir()?;
    let original_image_path = dir.path().join("original.bmp");
    let hidden_image_path = dir.path().join("hidden.bmp");
    let source_text_path = dir.path().join("source.txt");

    create_test_image(&original_image_path, 100, 100);
    let original_text = "This is a test message for the handler! 这是一个给处理器的测试信息！";
    fs::write(&source_text_path, original_text)?;

    // 2. 测试 handle_encode
    handle_encode(encode_args(
        &original_image_path,
        &source_text_path,
        Some(hidden_image_path.clone()),
    ))?;
    assert!(hidden_image_path.exists(), "Hidden image should be created.");

    // 隐写后的图像仍然是合法的 BMP，尺寸不变
    let reopened = image::open(&hidden_image_path)?;
    assert_eq!((reopened.width(), reopened.height()), (100, 100));

    // 3. 测试 handle_decode，输出名中的扩展名会被替换
    handle_decode(decode_args(
        &hidden_image_path,
        Some(dir.path().join("recovered.bin")),
    ))?;
    let recovered_text_path = dir.path().join("recovered.txt");
    assert!(
        recovered_text_path.exists(),
        "Recovered text file should be created."
    );

    // 4. 验证结果
    let recovered_text = fs::read_to_string(&recovered_text_path)?;
    assert_eq!(
        original_text, recovered_text,
        "Recovered text must match the original."
    );

    Ok(())
}

/// 验证 "Hello" 场景：头部原样复制，容器区域之外的像素完全不变，容器区域只改变最低位
#[test]
fn test_hello_scenario_preserves_image() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let cover_path = dir.path().join("cover.bmp");
    let stego_path = dir.path().join("stego.bmp");
    let secret_path = dir.path().join("hello.txt");

    create_test_image(&cover_path, 200, 167);
    fs::write(&secret_path, "Hello")?;

    handle_encode(encode_args(&cover_path, &secret_path, Some(stego_path.clone())))?;

    let cover = fs::read(&cover_path)?;
    let stego = fs::read(&stego_path)?;
    let embedded_end = HEADER + 152;

    assert_eq!(cover.len(), stego.len());
    assert_eq!(&cover[..HEADER], &stego[..HEADER]);
    assert_eq!(&cover[embedded_end..], &stego[embedded_end..]);
    cover[HEADER..embedded_end]
        .iter()
        .zip(&stego[HEADER..embedded_end])
        .for_each(|(before, after)| assert_eq!(before & 0xFE, after & 0xFE));

    handle_decode(decode_args(&stego_path, None))?;
    assert_eq!(fs::read(dir.path().join("decoded.txt"))?, b"Hello");

    Ok(())
}

/// 验证当用户不提供输出路径时，是否能正确生成默认路径并完成操作
#[test]
fn test_handle_encode_and_decode_with_defaults() -> anyhow::Result<()> {
    // 1. 准备环境
    let dir = tempdir()?;
    let original_image_path = dir.path().join("original.bmp");
    let source_path = dir.path().join("main.c");

    create_test_image(&original_image_path, 100, 100);
    let original_source = "int main(void) { return 0; }\n";
    fs::write(&source_path, original_source)?;

    // 2. 测试 handle_encode，不提供 dest 路径
    handle_encode(encode_args(&original_image_path, &source_path, None))?;

    let expected_hidden_path = dir.path().join("destination.bmp");
    assert!(
        expected_hidden_path.exists(),
        "Default hidden image should be created at: {:?}",
        expected_hidden_path
    );

    // 3. 测试 handle_decode，不提供输出路径
    handle_decode(decode_args(&expected_hidden_path, None))?;

    // 扩展名来自隐藏的数据
    let expected_recovered_path = dir.path().join("decoded.c");
    assert!(
        expected_recovered_path.exists(),
        "Default recovered file should be created at: {:?}",
        expected_recovered_path
    );

    // 4. 验证结果
    let recovered_source = fs::read_to_string(&expected_recovered_path)?;
    assert_eq!(
        original_source, recovered_source,
        "Recovered source from default file must match the original."
    );

    Ok(())
}

/// 验证覆盖保护机制以及 `--force` 标志是否按预期工作
#[test]
fn test_overwrite_protection_and_force_flag() -> anyhow::Result<()> {
    // 1. 准备环境
    let dir = tempdir()?;
    let image_path = dir.path().join("image.bmp");
    let text_path = dir.path().join("text.txt");
    let dest_path = dir.path().join("dest.bmp");

    create_test_image(&image_path, 50, 50);
    fs::write(&text_path, "some text")?;

    // 2. 场景一：测试覆盖保护
    fs::write(&dest_path, "this is a dummy file to be overwritten")?;
    assert!(dest_path.exists());

    let result = handle_encode(encode_args(&image_path, &text_path, Some(dest_path.clone())));
    assert!(result.is_err(), "Execution should fail without --force when file exists.");
    if let Err(e) = result {
        assert!(e.to_string().contains("Output file already exists"));
    }

    // 3. 场景二：测试强制覆盖
    let hide_args_with_force = EncodeArgs {
        force: true,
        ..encode_args(&image_path, &text_path, Some(dest_path.clone()))
    };
    let result = handle_encode(hide_args_with_force);
    assert!(result.is_ok(), "Execution should succeed with --force when file exists.");

    let dummy_content = fs::read(&dest_path)?;
    assert_ne!(dummy_content, b"this is a dummy file to be overwritten");

    // 4. 解码同样受覆盖保护
    let existing_secret = dir.path().join("decoded.txt");
    fs::write(&existing_secret, "keep me")?;

    let result = handle_decode(decode_args(&dest_path, None));
    assert!(result.is_err());
    if let Err(e) = result {
        assert!(format!("{e:#}").contains("Output file already exists"));
    }
    assert_eq!(fs::read_to_string(&existing_secret)?, "keep me");

    handle_decode(DecodeArgs {
        force: true,
        ..decode_args(&dest_path, None)
    })?;
    assert_eq!(fs::read_to_string(&existing_secret)?, "some text");

    Ok(())
}

/// 验证空间不足时的错误处理，并且不会留下残缺的输出文件
#[test]
fn test_handle_encode_not_enough_space() -> anyhow::Result<()> {
    // 1. 准备环境
    let dir = tempdir()?;
    let image_path = dir.path().join("small.bmp");
    let text_path = dir.path().join("large.txt");
    let dest_path = dir.path().join("dest.bmp");

    // 创建一个非常小的图片和一个非常大的文本
    create_test_image(&image_path, 10, 10);
    fs::write(&text_path, "a".repeat(5000))?;

    // 2. 执行并断言错误
    let result = handle_encode(encode_args(&image_path, &text_path, Some(dest_path.clone())));

    assert!(result.is_err());
    if let Err(e) = result {
        assert!(e.to_string().contains("Not enough space"));
    }
    assert!(!dest_path.exists(), "No output should be published on failure.");

    // 临时文件也已被清理
    let leftovers: Vec<_> = fs::read_dir(dir.path())?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name())
        .collect();
    assert_eq!(leftovers.len(), 2, "Unexpected files: {leftovers:?}");

    Ok(())
}

/// 验证解码未经隐写的图像时会报告标记不匹配
#[test]
fn test_decode_rejects_unencoded_image() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("plain.bmp");
    create_flat_image(&image_path, 40, 40);

    let result = handle_decode(decode_args(&image_path, None));

    assert!(result.is_err());
    if let Err(e) = result {
        assert!(e.to_string().contains("not an encoded file"));
    }
    // 只剩下原始图像，没有输出文件或临时文件
    let leftovers: Vec<_> = fs::read_dir(dir.path())?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name())
        .collect();
    assert_eq!(leftovers, ["plain.bmp"], "Unexpected files: {leftovers:?}");

    Ok(())
}

/// 验证文件名策略
#[test]
fn test_filename_validation() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("image.bmp");
    let good_secret = dir.path().join("secret.txt");
    let bad_secret = dir.path().join("secret.pdf");

    create_test_image(&image_path, 20, 20);
    fs::write(&good_secret, "x")?;
    fs::write(&bad_secret, "x")?;

    let result = handle_encode(encode_args(&image_path, &bad_secret, None));
    assert!(result.is_err_and(|e| e.to_string().contains("invalid extension")));

    let result = handle_encode(encode_args(
        &image_path,
        &good_secret,
        Some(dir.path().join("out.png")),
    ));
    assert!(result.is_err_and(|e| e.to_string().contains("invalid extension")));

    let result = handle_encode(encode_args(
        &image_path,
        &good_secret,
        Some(dir.path().join(".bmp")),
    ));
    assert!(result.is_err_and(|e| e.to_string().contains("missing a name")));

    let result = handle_decode(decode_args(&dir.path().join("image"), None));
    assert!(result.is_err_and(|e| e.to_string().contains("has no extension")));

    Ok(())
}
