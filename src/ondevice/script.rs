/// Builds the `/system/bin/sh` collector pushed to the device.
///
/// It only reads `/proc` and appends one CSV row per interval, so the device
/// pays almost nothing for being watched:
/// `HH:MM:SS,utime,stime,sys_total,sys_idle`.
pub fn device_script(package: &str, duration_secs: u64, interval_secs: u64, output: &str) -> String {
    format!(
        r#"#!/system/bin/sh
DURATION={duration_secs}
INTERVAL={interval_secs}
PKG="{package}"
OUT="{output}"

PID=$(pidof $PKG)
if [ -z "$PID" ]; then
    echo "App not running"
    exit 1
fi
set -- $PID
PID=$1

echo "timestamp,proc_utime,proc_stime,sys_total,sys_idle" > $OUT

END=$(($(date +%s) + DURATION))

while [ $(date +%s) -lt $END ]; do
    if [ -f /proc/$PID/stat ]; then
        read -r PSTAT < /proc/$PID/stat
        UTIME=$(echo "$PSTAT" | cut -d' ' -f14)
        STIME=$(echo "$PSTAT" | cut -d' ' -f15)

        read -r CSTAT < /proc/stat
        set -- $CSTAT
        shift
        SYS_TOTAL=$(($1 + $2 + $3 + $4 + $5 + $6 + $7))
        SYS_IDLE=$4

        TS=$(date +%H:%M:%S)
        echo "$TS,$UTIME,$STIME,$SYS_TOTAL,$SYS_IDLE"
        echo "$TS,$UTIME,$STIME,$SYS_TOTAL,$SYS_IDLE" >> $OUT
    else
        echo "Process died"
        break
    fi

    sleep $INTERVAL
done

echo "Done"
"#
    )
}
