// grassup/src/cli/messages.rs
//! Localized user-facing strings.
use clap::ValueEnum;
use grassup_common::targets::{GRASSCLIPPER, GRASSCLIPPER_X, GRASSCUTTER};
use grassup_common::InstallStage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Locale {
    #[default]
    #[value(name = "en", alias = "en-US")]
    English,
    #[value(name = "zh", aliases = ["zh-CN", "cn"])]
    Chinese,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::English, Locale::Chinese];

    pub fn label(self) -> &'static str {
        match self {
            Locale::English => "en-US (English)",
            Locale::Chinese => "zh-CN (Chinese Simplified)",
        }
    }
}

/// String table for one locale. Cheap to copy into event handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Messages {
    locale: Locale,
}

impl Messages {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Asked before any locale is known, so it is bilingual.
    pub fn language_prompt() -> &'static str {
        "Which language should the installer display text in? / 请选择安装程序的显示语言"
    }

    pub fn main_install(&self) -> &'static str {
        match self.locale {
            Locale::English => "What would you like to install?",
            Locale::Chinese => "你想安装什么？",
        }
    }

    pub fn main_install_exit(&self) -> &'static str {
        match self.locale {
            Locale::English => "Exit",
            Locale::Chinese => "退出",
        }
    }

    pub fn return_to_menu(&self) -> &'static str {
        match self.locale {
            Locale::English => "Press Enter to return to the main menu.",
            Locale::Chinese => "按回车键返回主菜单。",
        }
    }

    /// Display name of a target; unknown targets show their own name.
    pub fn target_name<'a>(&self, target: &'a str) -> &'a str {
        match (target, self.locale) {
            (GRASSCUTTER, Locale::English) => "Grasscutter (server)",
            (GRASSCUTTER, Locale::Chinese) => "Grasscutter（服务端）",
            (GRASSCLIPPER, Locale::English) => "GrassClipper (launcher)",
            (GRASSCLIPPER, Locale::Chinese) => "GrassClipper（启动器）",
            (GRASSCLIPPER_X, Locale::English) => "GrassClipper-X (launcher, preview)",
            (GRASSCLIPPER_X, Locale::Chinese) => "GrassClipper-X（启动器，预览版）",
            (other, _) => other,
        }
    }

    pub fn install_started(&self, target: &str) -> String {
        let name = self.target_name(target);
        match self.locale {
            Locale::English => format!("{name} has started installing. This may take a while."),
            Locale::Chinese => format!("{name} 开始安装，这可能需要一些时间。"),
        }
    }

    pub fn install_finished(&self, target: &str) -> String {
        let name = self.target_name(target);
        match self.locale {
            Locale::English => format!("Finished installing {name}!"),
            Locale::Chinese => format!("{name} 安装完成！"),
        }
    }

    pub fn install_failed(&self, target: &str) -> String {
        let name = self.target_name(target);
        match self.locale {
            Locale::English => format!("Failed to install {name}"),
            Locale::Chinese => format!("{name} 安装失败"),
        }
    }

    pub fn cleanup_warning(&self) -> &'static str {
        match self.locale {
            Locale::English => "Could not remove temporary file",
            Locale::Chinese => "无法删除临时文件",
        }
    }

    pub fn stage(&self, stage: InstallStage) -> &'static str {
        use InstallStage::*;
        match (self.locale, stage) {
            (Locale::English, Idle) => "Waiting",
            (Locale::English, Acquiring) => "Downloading files",
            (Locale::English, Cloning) => "Repositories downloaded",
            (Locale::English, Extracting) => "Extracting archive",
            (Locale::English, Merging) => "Copying files",
            (Locale::English, CleaningUp) => "Cleaning up",
            (Locale::English, Done) => "Done",
            (Locale::English, Errored) => "Failed",
            (Locale::Chinese, Idle) => "等待中",
            (Locale::Chinese, Acquiring) => "正在下载文件",
            (Locale::Chinese, Cloning) => "仓库下载完成",
            (Locale::Chinese, Extracting) => "正在解压",
            (Locale::Chinese, Merging) => "正在复制文件",
            (Locale::Chinese, CleaningUp) => "正在清理",
            (Locale::Chinese, Done) => "完成",
            (Locale::Chinese, Errored) => "失败",
        }
    }
}
