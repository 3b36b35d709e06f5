//! ffmpeg argument construction for raw frames piped on stdin

use polar_video::{Codec, Container, EncoderSelection, VideoParams};

#[derive(Debug, Clone)]
pub struct FfmpegCommandBuilder {
    width: u32,
    height: u32,
    frame_rate: f64,
    input_pixel_format: String,
    video_codec: String,
    output_pixel_format: Option<String>,
    preset: Option<String>,
    crf: Option<u8>,
    container_format: Option<String>,
    output_path: String,
}

impl FfmpegCommandBuilder {
    pub fn new(output_path: String, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame_rate: 10.0,
            input_pixel_format: "bgr24".to_string(),
            video_codec: "libx264".to_string(),
            output_pixel_format: Some("yuv420p".to_string()),
            preset: None,
            crf: None,
            container_format: None,
            output_path,
        }
    }

    /// Builder preset for one stream of a recording
    pub fn for_stream(output_path: String, params: &VideoParams, selection: &EncoderSelection) -> Self {
        let builder = Self::new(output_path, params.width, params.height)
            .with_frame_rate(params.frame_rate)
            .with_input_pixel_format(selection.pixel_format.ffmpeg_name().to_string());

        let builder = match selection.codec {
            Codec::H264 => builder,
            Codec::RawVideo => builder
                .with_video_codec("rawvideo".to_string())
                .with_output_pixel_format(None),
        };

        match selection.container {
            Container::Raw => builder.with_container_format(Some("rawvideo".to_string())),
            _ => builder,
        }
    }

    pub fn with_frame_rate(mut self, frame_rate: f64) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    pub fn with_input_pixel_format(mut self, pixel_format: String) -> Self {
        self.input_pixel_format = pixel_format;
        self
    }

    pub fn with_video_codec(mut self, codec: String) -> Self {
        self.video_codec = codec;
        self
    }

    pub fn with_output_pixel_format(mut self, pixel_format: Option<String>) -> Self {
        self.output_pixel_format = pixel_format;
        self
    }

    pub fn with_preset(mut self, preset: Option<String>) -> Self {
        self.preset = preset;
        self
    }

    pub fn with_crf(mut self, crf: Option<u8>) -> Self {
        self.crf = crf;
        self
    }

    /// Force the muxer instead of inferring it from the file extension
    pub fn with_container_format(mut self, format: Option<String>) -> Self {
        self.container_format = format;
        self
    }

    pub fn build(&self) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(), "error".to_string(),
            "-nostats".to_string(),
            "-y".to_string(),
            "-f".to_string(), "rawvideo".to_string(),
            "-pix_fmt".to_string(), self.input_pixel_format.clone(),
            "-s".to_string(), format!("{}x{}", self.width, self.height),
            "-r".to_string(), self.frame_rate.to_string(),
            "-i".to_string(), "-".to_string(),
            "-an".to_string(),
            "-c:v".to_string(), self.video_codec.clone(),
        ];

        if let Some(pix_fmt) = &self.output_pixel_format {
            args.push("-pix_fmt".to_string());
            args.push(pix_fmt.clone());
        }

        if let Some(preset) = &self.preset {
            args.push("-preset".to_string());
            args.push(preset.clone());
        }

        if let Some(crf) = self.crf {
            args.push("-crf".to_string());
            args.push(crf.to_string());
        }

        if let Some(format) = &self.container_format {
            args.push("-f".to_string());
            args.push(format.clone());
        }

        args.push(self.output_path.clone());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polar_video::PixelFormat;

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .rposition(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn test_default_builder() {
        let args = FfmpegCommandBuilder::new("video_0.mp4".to_string(), 2448, 2048).build();

        assert_eq!(args[5], "-f");
        assert_eq!(args[6], "rawvideo");
        assert_eq!(args[7], "-pix_fmt");
        assert_eq!(args[8], "bgr24");
        assert_eq!(value_after(&args, "-s"), Some("2448x2048"));
        assert_eq!(value_after(&args, "-r"), Some("10"));
        assert_eq!(value_after(&args, "-i"), Some("-"));
        assert_eq!(value_after(&args, "-c:v"), Some("libx264"));
        assert_eq!(value_after(&args, "-pix_fmt"), Some("yuv420p"));
        assert!(!args.contains(&"-preset".to_string()));
        assert_eq!(args.last().unwrap(), "video_0.mp4");
    }

    #[test]
    fn test_preset_and_crf() {
        let args = FfmpegCommandBuilder::new("out.mp4".to_string(), 64, 64)
            .with_preset(Some("veryfast".to_string()))
            .with_crf(Some(18))
            .build();

        assert_eq!(value_after(&args, "-preset"), Some("veryfast"));
        assert_eq!(value_after(&args, "-crf"), Some("18"));
    }

    #[test]
    fn test_stream_for_rgb_raw_avi() {
        let params = VideoParams::new(64, 32, 12.5);
        let selection = EncoderSelection {
            codec: Codec::RawVideo,
            container: Container::Avi,
            pixel_format: PixelFormat::Rgb8,
        };

        let args = FfmpegCommandBuilder::for_stream("video_45.avi".to_string(), &params, &selection).build();

        assert_eq!(args[8], "rgb24");
        assert_eq!(value_after(&args, "-s"), Some("64x32"));
        assert_eq!(value_after(&args, "-r"), Some("12.5"));
        assert_eq!(value_after(&args, "-c:v"), Some("rawvideo"));
        // Output keeps the input pixel format
        assert_eq!(args.iter().filter(|a| *a == "-pix_fmt").count(), 1);
        assert_eq!(args.last().unwrap(), "video_45.avi");
    }

    #[test]
    fn test_raw_container_forces_muxer() {
        let params = VideoParams::new(8, 8, 10.0);
        let args = FfmpegCommandBuilder::for_stream(
            "video_90.raw".to_string(),
            &params,
            &EncoderSelection::raw(PixelFormat::Bgr8),
        )
        .build();

        let n = args.len();
        assert_eq!(&args[n - 3..], &["-f", "rawvideo", "video_90.raw"]);
    }
}
